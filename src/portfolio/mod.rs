mod allocation;
mod models;
mod repository;
mod valuation;

pub use allocation::{AllocationBuckets, AllocationSlice};
pub use models::{HoldingValuation, PortfolioSummary, PositionRecord};
pub use repository::PortfolioRepository;
pub use valuation::{value_portfolio, ValuationError, FALLBACK_CATEGORY, UNKNOWN_FUND_NAME};
