use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use rust_decimal::Decimal;

use crate::clock::{Clock, SystemClock};
use crate::models::Quote;

use super::QuoteProvider;

/// Synthetic quote feed standing in for a live market API.
///
/// Each requested code gets the configured baseline net value with a
/// random swing of up to `max_swing_bps` basis points in either
/// direction. Swings are drawn as integer basis points so the resulting
/// price and percentage stay exact decimals.
pub struct SimulatedQuoteProvider {
    base_price: Decimal,
    max_swing_bps: i64,
    clock: Arc<dyn Clock>,
}

impl SimulatedQuoteProvider {
    pub fn new(base_price: Decimal, max_swing_bps: i64) -> Self {
        Self {
            base_price,
            max_swing_bps: max_swing_bps.abs(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

#[async_trait::async_trait]
impl QuoteProvider for SimulatedQuoteProvider {
    async fn fetch_quotes(&self, codes: &[String]) -> Result<HashMap<String, Quote>> {
        let today = self.clock.today();
        let mut rng = rand::thread_rng();
        let mut quotes = HashMap::with_capacity(codes.len());

        for code in codes {
            let bps: i64 = rng.gen_range(-self.max_swing_bps..=self.max_swing_bps);
            // 1 bps = 0.0001 as a fraction, 0.01 as a percentage.
            let swing = Decimal::new(bps, 4);
            let price = self.base_price * (Decimal::ONE + swing);

            quotes.insert(
                code.clone(),
                Quote {
                    fund_code: code.clone(),
                    price,
                    percent: Decimal::new(bps, 2),
                    as_of: today,
                },
            );
        }

        Ok(quotes)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
