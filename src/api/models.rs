use serde::{Deserialize, Serialize};

pub type RecipientId = String;

/// A roster row in canonical shape. Only `phone_number` is guaranteed to be
/// non-empty; which name fields are populated depends on the import schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl RosterRow {
    /// `name`, else `first last`, else the phone number.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            self.phone_number.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// A row of the displayed recipient collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    #[serde(flatten)]
    pub row: RosterRow,
}

impl Recipient {
    pub fn new(id: impl Into<RecipientId>, row: RosterRow) -> Self {
        Self { id: id.into(), row }
    }

    pub fn label(&self) -> String {
        self.row.label()
    }

    pub fn phone_number(&self) -> &str {
        &self.row.phone_number
    }
}

/// Body of a `send_message` POST. Built fresh per submit and never mutated
/// after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSubmission {
    pub action: &'static str,
    pub message: String,
    #[serde(rename = "all_numbers")]
    pub all_selected: bool,
    #[serde(rename = "select_numbers")]
    pub selected_ids: Vec<RecipientId>,
    #[serde(rename = "csv_data")]
    pub imported_rows: Vec<RosterRow>,
}

impl PendingSubmission {
    pub const ACTION: &'static str = "send_message";

    pub fn new(
        message: String,
        all_selected: bool,
        selected_ids: Vec<RecipientId>,
        imported_rows: Vec<RosterRow>,
    ) -> Self {
        Self {
            action: Self::ACTION,
            message,
            all_selected,
            selected_ids,
            imported_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterUpload {
    pub action: &'static str,
    pub csv_data: Vec<RosterRow>,
}

impl RosterUpload {
    pub const ACTION: &'static str = "upload_csv";

    pub fn new(csv_data: Vec<RosterRow>) -> Self {
        Self {
            action: Self::ACTION,
            csv_data,
        }
    }
}
