use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static fund metadata, keyed by fund code.
///
/// Owned by the ingestion pipeline (create-or-replace by code); valuation
/// only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundMetadata {
    /// Stable fund code. Doubles as the document key in the store.
    pub code: String,
    pub name: String,
    /// Free-text classification used for allocation roll-ups.
    pub category: String,
    pub updated_at: DateTime<Utc>,
}
