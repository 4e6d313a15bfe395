use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{FundMetadata, Holding};

use super::allocation::AllocationBuckets;

/// A holding joined with its fund metadata, as read from the store.
///
/// The metadata can be absent (a holding referencing a code ingestion
/// never saw); valuation substitutes defined fallbacks rather than
/// failing.
#[derive(Debug, Clone)]
pub struct PositionRecord {
    pub holding: Holding,
    pub fund: Option<FundMetadata>,
}

/// Computed financial snapshot of one holding. Never persisted.
///
/// All quantities are exact decimals; rendering to display strings is
/// the dashboard adapter's job.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingValuation {
    pub fund_code: String,
    pub name: String,
    pub category: String,
    pub shares: Decimal,
    pub cost_price: Decimal,
    pub current_price: Decimal,
    pub daily_percent: Decimal,
    pub market_value: Decimal,
    pub profit: Decimal,
    pub return_rate: Decimal,
    pub is_gain: bool,
    /// Quote as-of date; `None` when the valuation fell back to cost basis.
    pub as_of: Option<NaiveDate>,
}

/// Aggregate metrics over one valuation pass. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub total_market_value: Decimal,
    pub total_profit: Decimal,
    pub total_cost: Decimal,
    pub total_return_rate: Decimal,
    pub is_gain: bool,
    pub allocation: AllocationBuckets,
}
