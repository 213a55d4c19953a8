use std::collections::{HashMap, HashSet};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::api::models::{Recipient, RecipientId, RosterRow};

pub const LOCAL_ID_PREFIX: &str = "csv-";

/// Whether an import replaces the displayed collection or is appended to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    #[default]
    Replace,
    Extend,
}

/// The displayed recipient collection. Every load replaces it wholesale;
/// ids are unique within it.
#[derive(Debug, Clone, Default)]
pub struct RecipientBook {
    recipients: Vec<Recipient>,
    local: HashSet<RecipientId>,
    /// Id -> position in `recipients`. Rebuilt on every load.
    index: HashMap<RecipientId, usize>,
}

impl RecipientBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.recipients.iter().map(|r| r.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&Recipient> {
        self.index.get(id).map(|&pos| &self.recipients[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn reindex(&mut self) {
        self.index = self
            .recipients
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id.clone(), pos))
            .collect();
    }

    /// True for ids assigned by an import rather than by the server.
    pub fn is_local(&self, id: &str) -> bool {
        self.local.contains(id)
    }

    /// Id to put on the wire: server ids as-is, imported rows by phone
    /// number since that is how the server keys them once ingested.
    pub fn wire_id(&self, id: &str) -> Option<String> {
        let recipient = self.get(id)?;
        if self.is_local(id) {
            Some(recipient.phone_number().to_string())
        } else {
            Some(recipient.id.clone())
        }
    }

    /// Replaces the collection with server records sorted by label
    /// (case-insensitive), then id. Repeated ids keep their first record.
    pub fn load_from_server(&mut self, rows: Vec<Recipient>) {
        let mut seen = HashSet::new();
        let mut recipients: Vec<Recipient> = rows
            .into_iter()
            .filter(|r| {
                let fresh = seen.insert(r.id.clone());
                if !fresh {
                    warn!("server returned duplicate recipient id {}", r.id);
                }
                fresh
            })
            .collect();
        recipients.sort_by_cached_key(|r| (r.label().to_lowercase(), r.id.clone()));
        info!("loaded {} recipients from server", recipients.len());
        self.recipients = recipients;
        self.local.clear();
        self.reindex();
    }

    /// Gives each imported row a local id. `Replace` numbers rows
    /// `csv-1..n` so the same file always yields the same collection;
    /// `Extend` appends and skips any id already present.
    pub fn load_from_import(&mut self, rows: Vec<RosterRow>, mode: ImportMode) {
        let (mut recipients, mut local) = match mode {
            ImportMode::Replace => (Vec::with_capacity(rows.len()), HashSet::new()),
            ImportMode::Extend => (
                std::mem::take(&mut self.recipients),
                std::mem::take(&mut self.local),
            ),
        };
        let mut taken: HashSet<RecipientId> = recipients.iter().map(|r| r.id.clone()).collect();
        let mut next = 1usize;
        let imported = rows.len();
        for row in rows {
            let id = loop {
                let candidate = format!("{}{}", LOCAL_ID_PREFIX, next);
                next += 1;
                if !taken.contains(&candidate) {
                    break candidate;
                }
            };
            taken.insert(id.clone());
            local.insert(id.clone());
            recipients.push(Recipient::new(id, row));
        }
        info!(
            "imported {} rows ({:?}); {} recipients displayed",
            imported,
            mode,
            recipients.len()
        );
        self.recipients = recipients;
        self.local = local;
        self.reindex();
    }
}
