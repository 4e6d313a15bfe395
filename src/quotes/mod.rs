mod simulated;

pub use simulated::SimulatedQuoteProvider;

use std::collections::HashMap;

use anyhow::Result;

use crate::models::Quote;

/// Source of point-in-time market quotes.
///
/// A well-behaved provider returns one entry per requested code
/// (synthetic values are fine). Consumers must still tolerate a missing
/// key and fall back to cost basis, so a partial map degrades the
/// valuation rather than breaking it.
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotes(&self, codes: &[String]) -> Result<HashMap<String, Quote>>;

    fn name(&self) -> &str;
}

/// Fixed map of quotes, for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticQuoteProvider {
    quotes: HashMap<String, Quote>,
}

impl StaticQuoteProvider {
    pub fn new(quotes: impl IntoIterator<Item = Quote>) -> Self {
        Self {
            quotes: quotes
                .into_iter()
                .map(|q| (q.fund_code.clone(), q))
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl QuoteProvider for StaticQuoteProvider {
    async fn fetch_quotes(&self, codes: &[String]) -> Result<HashMap<String, Quote>> {
        Ok(codes
            .iter()
            .filter_map(|code| self.quotes.get(code).map(|q| (code.clone(), q.clone())))
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn static_provider_only_returns_known_codes() -> Result<()> {
        let provider = StaticQuoteProvider::new([Quote {
            fund_code: "F1".to_string(),
            price: Decimal::new(11, 1),
            percent: Decimal::new(150, 2),
            as_of: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        }]);

        let quotes = provider
            .fetch_quotes(&["F1".to_string(), "F2".to_string()])
            .await?;
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("F1"));
        assert!(!quotes.contains_key("F2"));
        Ok(())
    }
}
