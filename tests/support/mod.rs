#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use text_blast::api::client::recipients_from_json;
use text_blast::{
    ApiError, BlastForm, FormSettings, PendingSubmission, RecipientApi, Recipient, RosterRow,
    RosterUpload, RowNormalizer,
};
use tokio::sync::Notify;

type Outcome<T> = Result<T, (u16, String)>;

fn into_api<T>(outcome: Outcome<T>) -> Result<T, ApiError> {
    outcome.map_err(|(status, message)| ApiError::Status { status, message })
}

/// In-process stand-in for the recipient endpoint. Records every call and
/// can hold send/upload open until a `Notify` fires.
pub struct FakeApi {
    pub recipients: Mutex<Outcome<Vec<Recipient>>>,
    /// When set, fetches decode this body instead of `recipients`.
    pub body: Mutex<Option<Value>>,
    pub send_outcome: Mutex<Outcome<String>>,
    pub upload_outcome: Mutex<Outcome<String>>,
    pub sent: Mutex<Vec<PendingSubmission>>,
    pub uploads: Mutex<Vec<RosterUpload>>,
    pub fetch_calls: AtomicUsize,
    send_gate: Mutex<Option<Arc<Notify>>>,
    upload_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self {
            recipients: Mutex::new(Ok(recipients)),
            body: Mutex::new(None),
            send_outcome: Mutex::new(Ok("Message sent".into())),
            upload_outcome: Mutex::new(Ok("Roster stored".into())),
            sent: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            send_gate: Mutex::new(None),
            upload_gate: Mutex::new(None),
        }
    }

    pub fn fail_fetch(&self, status: u16, message: &str) {
        *self.recipients.lock().unwrap() = Err((status, message.into()));
    }

    pub fn serve_body(&self, body: Value) {
        *self.body.lock().unwrap() = Some(body);
    }

    pub fn set_recipients(&self, recipients: Vec<Recipient>) {
        *self.recipients.lock().unwrap() = Ok(recipients);
    }

    pub fn fail_send(&self, status: u16, message: &str) {
        *self.send_outcome.lock().unwrap() = Err((status, message.into()));
    }

    pub fn fail_upload(&self, status: u16, message: &str) {
        *self.upload_outcome.lock().unwrap() = Err((status, message.into()));
    }

    pub fn hold_sends(&self, gate: Arc<Notify>) {
        *self.send_gate.lock().unwrap() = Some(gate);
    }

    pub fn hold_uploads(&self, gate: Arc<Notify>) {
        *self.upload_gate.lock().unwrap() = Some(gate);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl RecipientApi for FakeApi {
    async fn fetch_recipients(&self) -> Result<Vec<Recipient>, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let body = self.body.lock().unwrap().clone();
        if let Some(body) = body {
            return recipients_from_json(&body);
        }
        let outcome = self.recipients.lock().unwrap().clone();
        into_api(outcome)
    }

    async fn send_message(&self, submission: &PendingSubmission) -> Result<String, ApiError> {
        self.sent.lock().unwrap().push(submission.clone());
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self.send_outcome.lock().unwrap().clone();
        into_api(outcome)
    }

    async fn upload_roster(&self, upload: &RosterUpload) -> Result<String, ApiError> {
        self.uploads.lock().unwrap().push(upload.clone());
        let gate = self.upload_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let outcome = self.upload_outcome.lock().unwrap().clone();
        into_api(outcome)
    }
}

pub fn server_recipient(id: &str, name: &str, phone: &str) -> Recipient {
    Recipient::new(
        id,
        RosterRow {
            name: Some(name.into()),
            phone_number: phone.into(),
            ..Default::default()
        },
    )
}

pub fn sample_server_roster() -> Vec<Recipient> {
    vec![
        server_recipient("+15550002", "Bob Smith", "+15550002"),
        server_recipient("+15550001", "alice Johnson", "+15550001"),
        server_recipient("+15550003", "Charlie Brown", "+15550003"),
    ]
}

pub fn form_with(api: FakeApi, settings: FormSettings) -> BlastForm<FakeApi> {
    BlastForm::new(api, RowNormalizer::default(), settings)
}

pub fn form(api: FakeApi) -> BlastForm<FakeApi> {
    form_with(api, FormSettings::default())
}
