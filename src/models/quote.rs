use chrono::NaiveDate;
use rust_decimal::Decimal;

/// A point-in-time market price for a fund.
///
/// Produced fresh per valuation request; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub fund_code: String,
    pub price: Decimal,
    /// Day-over-day change in percent, already at two decimal places.
    pub percent: Decimal,
    pub as_of: NaiveDate,
}
