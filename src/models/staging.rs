//! Raw staging rows as exported into the temp collections.
//!
//! Exports are loosely typed: numeric columns arrive quoted or bare
//! depending on the tool that produced the CSV, and optional columns are
//! simply absent. These types pin down exactly which fields may be
//! missing and what the documented defaults are, so the transform step
//! stays auditable.

use serde::Deserialize;

/// A scalar that may arrive as a JSON string or number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(serde_json::Number),
}

impl RawValue {
    /// Canonical string form: text is trimmed, numbers are rendered as-is.
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Text(s) => s.trim().to_string(),
            RawValue::Number(n) => n.to_string(),
        }
    }
}

/// One row of the `temp_funds` staging collection.
///
/// Each row is one lot: fund identity plus the held shares and average
/// cost. `fund_name`/`fund_type` may be absent and default downstream.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFundRow {
    pub fund_code: RawValue,
    #[serde(default)]
    pub fund_name: Option<String>,
    #[serde(default)]
    pub fund_type: Option<String>,
    pub shares: RawValue,
    pub cost: RawValue,
}

/// One row of the `temp_transactions` staging collection.
///
/// `side` carries the source's trade-direction token (localized in the
/// legacy export); `price`/`amount` default to zero when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransactionRow {
    pub fund_code: RawValue,
    #[serde(rename = "type", default)]
    pub side: Option<String>,
    pub date: String,
    pub shares: RawValue,
    #[serde(default)]
    pub price: Option<RawValue>,
    #[serde(default)]
    pub amount: Option<RawValue>,
    #[serde(default)]
    pub note: Option<String>,
}
