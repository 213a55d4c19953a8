pub mod api;
pub mod app;
pub mod error;
pub mod form;
pub mod roster;
pub mod selection;
pub mod utils;

pub use api::client::{ApiClient, RecipientApi};
pub use api::models::{PendingSubmission, Recipient, RecipientId, RosterRow, RosterUpload};
pub use app::AppConfig;
pub use error::{ApiError, ConfigError, FormError, ImportError};
pub use form::{BlastForm, FormSettings, FormState};
pub use roster::{
    CanonicalField, ColumnMapper, ImportMode, NameSchema, RawRow, RecipientBook, RowNormalizer,
};
pub use selection::{RefreshPolicy, SelectionTracker};
