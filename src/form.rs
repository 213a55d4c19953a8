use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};

use crate::api::client::RecipientApi;
use crate::api::models::{PendingSubmission, RosterRow, RosterUpload};
use crate::error::{ApiError, FormError, ImportError};
use crate::roster::{ImportMode, RecipientBook, RowNormalizer};
use crate::selection::{RefreshPolicy, SelectionTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormSettings {
    pub import_mode: ImportMode,
    pub refresh_policy: RefreshPolicy,
    pub delimiter: u8,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            import_mode: ImportMode::default(),
            refresh_policy: RefreshPolicy::default(),
            delimiter: b',',
        }
    }
}

/// Everything the form shows. Owned by [`BlastForm`]; callers only get
/// read access.
#[derive(Debug, Default)]
pub struct FormState {
    pub message: String,
    pub recipients: RecipientBook,
    pub selection: SelectionTracker,
    /// Rows from the last import, held until sent or uploaded.
    pub imported: Vec<RosterRow>,
    /// Set when the last refresh failed; the previous recipients stay.
    pub fetch_error: Option<String>,
    /// Bumped whenever an import replaces the buffer outright.
    import_generation: u64,
    /// Rows already taken off the front of the buffer in this generation.
    import_base: usize,
}

/// Which buffered rows a dispatch carried.
#[derive(Debug, Clone, Copy)]
struct ImportMark {
    generation: u64,
    end: usize,
}

impl FormState {
    fn import_mark(&self) -> ImportMark {
        ImportMark {
            generation: self.import_generation,
            end: self.import_base + self.imported.len(),
        }
    }

    /// Drops the rows covered by `mark`. Rows imported after the mark stay,
    /// and nothing is dropped if the buffer was replaced since.
    fn release_imported(&mut self, mark: ImportMark) {
        if mark.generation != self.import_generation || mark.end <= self.import_base {
            return;
        }
        let count = (mark.end - self.import_base).min(self.imported.len());
        self.imported.drain(..count);
        self.import_base += count;
        if !self.imported.is_empty() {
            debug!("{} rows imported mid-flight kept", self.imported.len());
        }
    }

    fn reconcile_selection(&mut self, policy: RefreshPolicy) {
        let dropped = self.selection.reconcile(&self.recipients, policy);
        if dropped > 0 {
            info!("{} selected recipients no longer listed", dropped);
        }
    }
}

struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Form controller. Meant for a single thread: operations take `&self` so
/// several can be pending at once, and `send`/`upload_roster` each refuse
/// to overlap with themselves. State borrows never span an `.await`.
pub struct BlastForm<A> {
    api: A,
    normalizer: RowNormalizer,
    settings: FormSettings,
    state: RefCell<FormState>,
    sending: Cell<bool>,
    uploading: Cell<bool>,
}

impl<A: RecipientApi> BlastForm<A> {
    pub fn new(api: A, normalizer: RowNormalizer, settings: FormSettings) -> Self {
        Self {
            api,
            normalizer,
            settings,
            state: RefCell::new(FormState::default()),
            sending: Cell::new(false),
            uploading: Cell::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn settings(&self) -> &FormSettings {
        &self.settings
    }

    pub fn state(&self) -> Ref<'_, FormState> {
        self.state.borrow()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.get()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.get()
    }

    pub fn set_message(&self, text: impl Into<String>) {
        self.state.borrow_mut().message = text.into();
    }

    pub fn select_all(&self) {
        let state = &mut *self.state.borrow_mut();
        state.selection.select_all(&state.recipients);
    }

    pub fn clear_selection(&self) {
        self.state.borrow_mut().selection.clear();
    }

    pub fn toggle(&self, id: &str) -> bool {
        let state = &mut *self.state.borrow_mut();
        state.selection.toggle(&state.recipients, id)
    }

    /// Replaces the recipients from the server. On failure the current
    /// recipients are kept and `fetch_error` is set.
    pub async fn refresh(&self) -> Result<usize, ApiError> {
        match self.api.fetch_recipients().await {
            Ok(rows) => {
                let state = &mut *self.state.borrow_mut();
                state.recipients.load_from_server(rows);
                state.reconcile_selection(self.settings.refresh_policy);
                state.fetch_error = None;
                Ok(state.recipients.len())
            }
            Err(e) => {
                warn!("recipient fetch failed: {}", e);
                self.state.borrow_mut().fetch_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Normalizes a roster file and shows its rows. A parse failure leaves
    /// the form untouched.
    pub fn import_csv(&self, bytes: &[u8]) -> Result<usize, ImportError> {
        let rows = self.normalizer.parse(bytes, self.settings.delimiter)?;
        Ok(self.apply_import(rows))
    }

    pub async fn import_file(&self, path: &Path) -> Result<usize, ImportError> {
        let rows = self
            .normalizer
            .read_file(path, self.settings.delimiter)
            .await?;
        Ok(self.apply_import(rows))
    }

    fn apply_import(&self, rows: Vec<RosterRow>) -> usize {
        let count = rows.len();
        let state = &mut *self.state.borrow_mut();
        match self.settings.import_mode {
            ImportMode::Replace => {
                state.imported = rows.clone();
                state.import_generation += 1;
                state.import_base = 0;
            }
            ImportMode::Extend => state.imported.extend(rows.iter().cloned()),
        }
        state.recipients.load_from_import(rows, self.settings.import_mode);
        state.reconcile_selection(self.settings.refresh_policy);
        count
    }

    /// The body `send` would dispatch right now.
    pub fn pending_submission(&self) -> PendingSubmission {
        let state = self.state.borrow();
        let mut seen = HashSet::new();
        let selected_ids = state
            .selection
            .selected_in(&state.recipients)
            .into_iter()
            .filter_map(|r| state.recipients.wire_id(&r.id))
            .filter(|id| seen.insert(id.clone()))
            .collect();
        PendingSubmission::new(
            state.message.clone(),
            state.selection.all_selected(),
            selected_ids,
            state.imported.clone(),
        )
    }

    /// Sends the current message. On success the dispatched message,
    /// selection and imported rows are cleared, unless edited while the
    /// request was out, and recipients are refreshed. On failure nothing
    /// local changes.
    pub async fn send(&self) -> Result<String, FormError> {
        if self.state.borrow().message.trim().is_empty() {
            return Err(FormError::EmptyMessage);
        }
        let _flight = InFlight::acquire(&self.sending).ok_or(FormError::SendInFlight)?;

        let submission = self.pending_submission();
        let (selection, mark) = {
            let state = self.state.borrow();
            (state.selection.clone(), state.import_mark())
        };
        info!(
            "sending message: all={} selected={} imported={}",
            submission.all_selected,
            submission.selected_ids.len(),
            submission.imported_rows.len()
        );
        debug!("message text: {:?}", submission.message);

        let confirmation = match self.api.send_message(&submission).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                warn!("send failed: {}", e);
                return Err(e.into());
            }
        };

        {
            let mut state = self.state.borrow_mut();
            if state.message == submission.message {
                state.message.clear();
            }
            if state.selection == selection {
                state.selection.clear();
            }
            state.release_imported(mark);
        }
        // A failed refresh is recorded in fetch_error; the send itself went through.
        let _ = self.refresh().await;
        Ok(confirmation)
    }

    /// Uploads the import buffer. On success the uploaded rows leave the
    /// buffer and recipients are refreshed; on failure the buffer stays for
    /// a retry.
    pub async fn upload_roster(&self) -> Result<String, FormError> {
        if self.state.borrow().imported.is_empty() {
            return Err(FormError::EmptyImport);
        }
        let _flight = InFlight::acquire(&self.uploading).ok_or(FormError::UploadInFlight)?;

        let (upload, mark) = {
            let state = self.state.borrow();
            (RosterUpload::new(state.imported.clone()), state.import_mark())
        };
        info!("uploading roster: {} rows", upload.csv_data.len());

        let confirmation = match self.api.upload_roster(&upload).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                warn!("upload failed: {}", e);
                return Err(e.into());
            }
        };

        self.state.borrow_mut().release_imported(mark);
        let _ = self.refresh().await;
        Ok(confirmation)
    }
}
