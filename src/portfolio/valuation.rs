use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::format::round2;
use crate::models::Quote;

use super::allocation::AllocationBuckets;
use super::models::{HoldingValuation, PortfolioSummary, PositionRecord};

/// Display name for a holding whose metadata was never ingested.
pub const UNKNOWN_FUND_NAME: &str = "Unknown Fund";
/// Category used when metadata is absent or carries no classification.
pub const FALLBACK_CATEGORY: &str = "Other";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValuationError {
    /// A holding carried a non-numeric quantity. The whole valuation
    /// aborts so the summary always reflects exactly the returned rows.
    #[error("Holding {code}: invalid {field} value {value:?}")]
    InvalidHolding {
        code: String,
        field: &'static str,
        value: String,
    },
}

fn holding_field(code: &str, field: &'static str, value: &str) -> Result<Decimal, ValuationError> {
    Decimal::from_str(value.trim()).map_err(|_| ValuationError::InvalidHolding {
        code: code.to_string(),
        field,
        value: value.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Value every position against the given quotes, in input order.
///
/// Missing quotes and missing metadata have defined fallbacks; the only
/// failure mode is a non-numeric holding quantity, which aborts with no
/// partial results.
pub fn value_portfolio(
    positions: &[PositionRecord],
    quotes: &HashMap<String, Quote>,
) -> Result<(Vec<HoldingValuation>, PortfolioSummary), ValuationError> {
    let mut rows = Vec::with_capacity(positions.len());
    let mut total_market_value = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut allocation = AllocationBuckets::new();

    for position in positions {
        let code = position.holding.fund_code.as_str();
        let shares = holding_field(code, "total_shares", &position.holding.total_shares)?;
        let cost_price = holding_field(code, "avg_cost", &position.holding.avg_cost)?;

        let name = non_empty(position.fund.as_ref().map(|f| f.name.as_str()))
            .unwrap_or(UNKNOWN_FUND_NAME)
            .to_string();
        let category = non_empty(position.fund.as_ref().map(|f| f.category.as_str()))
            .unwrap_or(FALLBACK_CATEGORY)
            .to_string();

        // No live quote means we assume zero unrealized movement: the
        // current price falls back to the holding's cost basis.
        let quote = quotes.get(code);
        let current_price = quote.map(|q| q.price).unwrap_or(cost_price);
        let daily_percent = quote.map(|q| q.percent).unwrap_or(Decimal::ZERO);
        let as_of = quote.map(|q| q.as_of);

        let market_value = shares * current_price;
        let cost_value = shares * cost_price;
        let profit = market_value - cost_value;
        let return_rate = if cost_value.is_zero() {
            Decimal::ZERO
        } else {
            profit / cost_value * Decimal::ONE_HUNDRED
        };

        total_market_value += market_value;
        total_profit += profit;
        total_cost += cost_value;

        // Category totals accumulate the two-decimal display value, not
        // the exact one: they must sum to the per-holding figures shown
        // to the user.
        allocation.add(&category, round2(market_value));

        rows.push(HoldingValuation {
            fund_code: code.to_string(),
            name,
            category,
            shares,
            cost_price,
            current_price,
            daily_percent,
            market_value,
            profit,
            return_rate,
            is_gain: profit >= Decimal::ZERO,
            as_of,
        });
    }

    let total_return_rate = if total_cost.is_zero() {
        Decimal::ZERO
    } else {
        total_profit / total_cost * Decimal::ONE_HUNDRED
    };

    Ok((
        rows,
        PortfolioSummary {
            total_market_value,
            total_profit,
            total_cost,
            total_return_rate,
            is_gain: total_profit >= Decimal::ZERO,
            allocation,
        },
    ))
}
