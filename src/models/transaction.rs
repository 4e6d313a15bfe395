use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;

use super::{Id, IdGenerator};

/// Direction of a trade. A closed two-element enumeration; anything the
/// source exports outside it must be resolved before a record is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unrecognized trade side token {token:?}")]
pub struct TradeSideError {
    pub token: String,
}

impl TradeSide {
    /// Map a source token to a side. English tokens and the legacy CSV
    /// export tokens are both accepted; anything else is an error rather
    /// than a guessed direction.
    pub fn parse_token(token: &str) -> Result<Self, TradeSideError> {
        match token.trim().to_lowercase().as_str() {
            "buy" | "买入" => Ok(Self::Buy),
            "sell" | "卖出" => Ok(Self::Sell),
            _ => Err(TradeSideError {
                token: token.trim().to_string(),
            }),
        }
    }
}

/// A single trade in a fund. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Id,
    pub fund_code: String,
    pub side: TradeSide,
    pub trade_date: NaiveDate,
    pub shares: String,
    pub price: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new_with_generator(
        ids: &dyn IdGenerator,
        clock: &dyn Clock,
        fund_code: impl Into<String>,
        side: TradeSide,
        trade_date: NaiveDate,
        shares: impl Into<String>,
    ) -> Self {
        Self {
            id: ids.new_id(),
            fund_code: fund_code.into(),
            side,
            trade_date,
            shares: shares.into(),
            price: "0".to_string(),
            amount: "0".to_string(),
            note: None,
            created_at: clock.now(),
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = price.into();
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = amount.into();
        self
    }

    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }
}
