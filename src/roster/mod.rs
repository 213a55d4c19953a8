pub mod mapper;
pub mod normalizer;
pub mod reconciler;

pub use mapper::{CanonicalField, ColumnMapper};
pub use normalizer::{NameSchema, RawRow, RowNormalizer};
pub use reconciler::{ImportMode, RecipientBook};
