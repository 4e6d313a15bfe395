use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// A position in a fund: shares owned and average acquisition cost.
///
/// Quantities are decimal strings, parsed only when valued. `total_cost`
/// is derived once at ingestion time as shares × cost; it is not
/// recomputed from later quotes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: Id,
    pub fund_code: String,
    pub total_shares: String,
    pub avg_cost: String,
    pub total_cost: String,
    pub updated_at: DateTime<Utc>,
}
