use thiserror::Error;

/// Failures reported by the recipient endpoint or the transport underneath it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success status. `message` is the server's own reason when the body
    /// carried one, otherwise a generic line.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not parse roster file: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not read roster file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("message is empty")]
    EmptyMessage,
    #[error("no imported rows to upload")]
    EmptyImport,
    #[error("a send is already in progress")]
    SendInFlight,
    #[error("an upload is already in progress")]
    UploadInFlight,
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl FormError {
    /// Local validation failures never reach the network.
    pub fn is_validation(&self) -> bool {
        matches!(self, FormError::EmptyMessage | FormError::EmptyImport)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("could not serialize config: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no config directory available")]
    NoConfigDir,
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),
    #[error("no endpoint configured")]
    MissingEndpoint,
    #[error("delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}
