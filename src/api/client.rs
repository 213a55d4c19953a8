use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::api::models::{PendingSubmission, Recipient, RosterRow, RosterUpload};
use crate::error::ApiError;

/// The recipient endpoint as seen by the form: one GET for the roster, one
/// POST shape per action.
#[async_trait]
pub trait RecipientApi: Send + Sync {
    async fn fetch_recipients(&self) -> Result<Vec<Recipient>, ApiError>;
    async fn send_message(&self, submission: &PendingSubmission) -> Result<String, ApiError>;
    async fn upload_roster(&self, upload: &RosterUpload) -> Result<String, ApiError>;
}

pub struct ApiClient {
    pub http: HttpClient,
    pub endpoint: Url,
}

impl ApiClient {
    pub fn new(endpoint: Url) -> Self {
        Self {
            http: HttpClient::new(),
            endpoint,
        }
    }

    async fn post<T: Serialize + ?Sized>(&self, body: &T) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }
        Ok(confirmation(&text))
    }
}

#[async_trait]
impl RecipientApi for ApiClient {
    async fn fetch_recipients(&self) -> Result<Vec<Recipient>, ApiError> {
        let resp = self.http.get(self.endpoint.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }
        let json: Value = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        recipients_from_json(&json)
    }

    async fn send_message(&self, submission: &PendingSubmission) -> Result<String, ApiError> {
        debug!(
            "posting send_message: all={} selected={} rows={}",
            submission.all_selected,
            submission.selected_ids.len(),
            submission.imported_rows.len()
        );
        self.post(submission).await
    }

    async fn upload_roster(&self, upload: &RosterUpload) -> Result<String, ApiError> {
        debug!("posting upload_csv: rows={}", upload.csv_data.len());
        self.post(upload).await
    }
}

/// Accepts a bare array or an object wrapping one. Any other shape is a
/// decode error. Records without an id or a phone number are skipped.
pub fn recipients_from_json(json: &Value) -> Result<Vec<Recipient>, ApiError> {
    let items = json
        .as_array()
        .or_else(|| {
            ["Items", "items", "data", "recipients", "clients"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_array()))
        })
        .ok_or_else(|| ApiError::Decode("expected a list of recipients".into()))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match recipient_from_value(item) {
            Some(recipient) => out.push(recipient),
            None => warn!("skipping server record without id or phone number"),
        }
    }
    Ok(out)
}

fn recipient_from_value(item: &Value) -> Option<Recipient> {
    let id = match item.get("id")? {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let phone_number = text_field(item, &["phone_number", "phoneNumber", "phone"])?;
    Some(Recipient {
        id,
        row: RosterRow {
            name: text_field(item, &["name"]),
            first_name: text_field(item, &["first_name", "firstName"]),
            last_name: text_field(item, &["last_name", "lastName"]),
            phone_number,
            email: text_field(item, &["email"]),
        },
    })
}

fn text_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| item.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reason to show for a failed request: a JSON string body, or the first
/// `error`/`message`/`errorMessage` field of a JSON object.
pub fn error_message(status: u16, body: &str) -> String {
    let reason = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => Some(s),
        Ok(json) => text_field(&json, &["error", "message", "errorMessage"]),
        Err(_) => None,
    };
    reason
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with HTTP {}", status))
}

fn confirmation(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(json) => text_field(&json, &["message"]).unwrap_or_else(|| body.trim().to_string()),
        Err(_) => body.trim().to_string(),
    }
}
