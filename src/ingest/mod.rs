//! Offline ETL from the staging collections into the canonical ones.
//!
//! Raw rows are read from `temp_funds`/`temp_transactions`, cleaned into
//! canonical records, and written in bounded concurrent batches. Fund
//! metadata is upserted by code, so re-running over the same staging
//! data converges to one record per fund. Holdings and transactions are
//! unkeyed inserts: re-running duplicates them. Operators must treat a
//! re-run against unchanged staging data as a duplicating operation for
//! those two collections.

mod batch;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::format::parse_decimal;
use crate::models::{
    FundMetadata, Holding, IdGenerator, RawFundRow, RawTransactionRow, TradeSide, Transaction,
    UuidIdGenerator,
};
use crate::store::Store;

/// Name given to funds whose staging rows carry none.
pub const DEFAULT_FUND_NAME: &str = "Unnamed Fund";
/// Category given to funds whose staging rows carry none.
pub const DEFAULT_FUND_CATEGORY: &str = "Mixed";

/// What to do with a trade-direction token the parser does not know.
///
/// The legacy exporter silently treated everything that was not a buy as
/// a sell, which turns typos into phantom sales. Rejecting is the
/// default; `AssumeSell` exists for operators who need byte-compatible
/// re-imports of old data and logs every row it converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownTradeSidePolicy {
    #[default]
    Reject,
    AssumeSell,
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Upper bound on rows read from each staging collection per run.
    pub staging_row_cap: usize,
    /// Records per concurrent write batch.
    pub write_batch_size: usize,
    pub unknown_trade_side: UnknownTradeSidePolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            staging_row_cap: 1000,
            write_batch_size: 50,
            unknown_trade_side: UnknownTradeSidePolicy::default(),
        }
    }
}

/// Counts of records written by a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub funds: usize,
    pub portfolios: usize,
    pub transactions: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Failed to read staging collection {collection}")]
    StagingRead {
        collection: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Staging {collection} row {row}: {reason}")]
    InvalidRow {
        collection: &'static str,
        row: usize,
        reason: String,
    },

    #[error("Staging transaction row {row} (fund {code}): unrecognized trade side token {token:?}")]
    UnknownTradeSide {
        row: usize,
        code: String,
        token: String,
    },

    /// A batch failed mid-run. `committed` counts only records from
    /// fully completed batches of this collection; earlier collections
    /// were written in full.
    #[error("Write to {collection} failed after {committed} committed records")]
    WriteFailed {
        collection: &'static str,
        committed: usize,
        #[source]
        source: anyhow::Error,
    },
}

/// The transform + load pipeline. Safe to re-run for fund metadata;
/// duplicating for holdings and transactions (see module docs).
pub struct IngestPipeline {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    options: IngestOptions,
}

impl IngestPipeline {
    pub fn new(store: Arc<dyn Store>, options: IngestOptions) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIdGenerator),
            options,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub async fn run(&self) -> Result<IngestStats, IngestError> {
        let cap = self.options.staging_row_cap;

        let raw_funds =
            self.store
                .staged_funds(cap)
                .await
                .map_err(|source| IngestError::StagingRead {
                    collection: "temp_funds",
                    source,
                })?;
        let raw_transactions = self.store.staged_transactions(cap).await.map_err(|source| {
            IngestError::StagingRead {
                collection: "temp_transactions",
                source,
            }
        })?;

        tracing::info!(
            funds = raw_funds.len(),
            transactions = raw_transactions.len(),
            "Read staging rows"
        );

        let (funds, holdings) = self.transform_fund_rows(&raw_funds)?;
        let transactions = self.transform_transaction_rows(&raw_transactions)?;

        let stats = IngestStats {
            funds: funds.len(),
            portfolios: holdings.len(),
            transactions: transactions.len(),
        };

        let batch_size = self.options.write_batch_size;

        let store = self.store.clone();
        batch::write_batches(funds, batch_size, move |fund: FundMetadata| {
            let store = store.clone();
            async move { store.upsert_fund(&fund).await }
        })
        .await
        .map_err(|failure| IngestError::WriteFailed {
            collection: "fund_basic",
            committed: failure.committed,
            source: failure.source,
        })?;

        let store = self.store.clone();
        batch::write_batches(holdings, batch_size, move |holding: Holding| {
            let store = store.clone();
            async move { store.insert_holding(&holding).await }
        })
        .await
        .map_err(|failure| IngestError::WriteFailed {
            collection: "user_portfolio",
            committed: failure.committed,
            source: failure.source,
        })?;

        let store = self.store.clone();
        batch::write_batches(transactions, batch_size, move |txn: Transaction| {
            let store = store.clone();
            async move { store.insert_transaction(&txn).await }
        })
        .await
        .map_err(|failure| IngestError::WriteFailed {
            collection: "fund_transactions",
            committed: failure.committed,
            source: failure.source,
        })?;

        tracing::info!(
            funds = stats.funds,
            portfolios = stats.portfolios,
            transactions = stats.transactions,
            "Ingestion complete"
        );

        Ok(stats)
    }

    /// Derive deduplicated fund metadata and one holding per raw row.
    ///
    /// The first row mentioning a fund code wins for name/category.
    /// Holdings are deliberately not consolidated: multiple lots of the
    /// same fund stay separate records.
    fn transform_fund_rows(
        &self,
        rows: &[RawFundRow],
    ) -> Result<(Vec<FundMetadata>, Vec<Holding>), IngestError> {
        let now = self.clock.now();
        let mut seen = HashSet::new();
        let mut funds = Vec::new();
        let mut holdings = Vec::with_capacity(rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            let code = row.fund_code.as_text();
            if code.is_empty() {
                return Err(IngestError::InvalidRow {
                    collection: "temp_funds",
                    row: row_index,
                    reason: "empty fund code".to_string(),
                });
            }

            if seen.insert(code.clone()) {
                let name = row
                    .fund_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_FUND_NAME);
                let category = row
                    .fund_type
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_FUND_CATEGORY);

                funds.push(FundMetadata {
                    code: code.clone(),
                    name: name.to_string(),
                    category: category.to_string(),
                    updated_at: now,
                });
            }

            let shares = parse_decimal(&row.shares.as_text()).map_err(|e| {
                IngestError::InvalidRow {
                    collection: "temp_funds",
                    row: row_index,
                    reason: format!("shares: {e}"),
                }
            })?;
            let cost = parse_decimal(&row.cost.as_text()).map_err(|e| IngestError::InvalidRow {
                collection: "temp_funds",
                row: row_index,
                reason: format!("cost: {e}"),
            })?;

            // Total cost is fixed at transform time; it is never
            // recomputed from later prices.
            let total_cost = shares * cost;

            holdings.push(Holding {
                id: self.ids.new_id(),
                fund_code: code,
                total_shares: shares.normalize().to_string(),
                avg_cost: cost.normalize().to_string(),
                total_cost: total_cost.normalize().to_string(),
                updated_at: now,
            });
        }

        Ok((funds, holdings))
    }

    fn transform_transaction_rows(
        &self,
        rows: &[RawTransactionRow],
    ) -> Result<Vec<Transaction>, IngestError> {
        let mut transactions = Vec::with_capacity(rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            let code = row.fund_code.as_text();
            if code.is_empty() {
                return Err(IngestError::InvalidRow {
                    collection: "temp_transactions",
                    row: row_index,
                    reason: "empty fund code".to_string(),
                });
            }

            let token = row.side.as_deref().unwrap_or("");
            let side = match TradeSide::parse_token(token) {
                Ok(side) => side,
                Err(err) => match self.options.unknown_trade_side {
                    UnknownTradeSidePolicy::Reject => {
                        return Err(IngestError::UnknownTradeSide {
                            row: row_index,
                            code,
                            token: err.token,
                        });
                    }
                    UnknownTradeSidePolicy::AssumeSell => {
                        tracing::warn!(
                            row = row_index,
                            fund = %code,
                            token = %err.token,
                            "Unrecognized trade side token treated as a sell (legacy policy)"
                        );
                        TradeSide::Sell
                    }
                },
            };

            let trade_date =
                NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
                    IngestError::InvalidRow {
                        collection: "temp_transactions",
                        row: row_index,
                        reason: format!("date {:?}: {e}", row.date),
                    }
                })?;

            let shares = parse_decimal(&row.shares.as_text()).map_err(|e| {
                IngestError::InvalidRow {
                    collection: "temp_transactions",
                    row: row_index,
                    reason: format!("shares: {e}"),
                }
            })?;

            let price = match &row.price {
                Some(value) => parse_decimal(&value.as_text()).map_err(|e| {
                    IngestError::InvalidRow {
                        collection: "temp_transactions",
                        row: row_index,
                        reason: format!("price: {e}"),
                    }
                })?,
                None => rust_decimal::Decimal::ZERO,
            };
            let amount = match &row.amount {
                Some(value) => parse_decimal(&value.as_text()).map_err(|e| {
                    IngestError::InvalidRow {
                        collection: "temp_transactions",
                        row: row_index,
                        reason: format!("amount: {e}"),
                    }
                })?,
                None => rust_decimal::Decimal::ZERO,
            };

            let txn = Transaction::new_with_generator(
                self.ids.as_ref(),
                self.clock.as_ref(),
                code,
                side,
                trade_date,
                shares.normalize().to_string(),
            )
            .with_price(price.normalize().to_string())
            .with_amount(amount.normalize().to_string())
            .with_note(row.note.clone());

            transactions.push(txn);
        }

        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn fund_row(json: serde_json::Value) -> RawFundRow {
        serde_json::from_value(json).unwrap()
    }

    fn txn_row(json: serde_json::Value) -> RawTransactionRow {
        serde_json::from_value(json).unwrap()
    }

    #[tokio::test]
    async fn dedupes_fund_metadata_but_not_holdings() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_funds(vec![
                fund_row(serde_json::json!({
                    "fund_code": "F1", "fund_name": "First", "fund_type": "Equity",
                    "shares": "100", "cost": "1.5"
                })),
                fund_row(serde_json::json!({
                    "fund_code": "F1", "fund_name": "Renamed later", "fund_type": "Bond",
                    "shares": "50", "cost": "1.6"
                })),
            ])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        let stats = pipeline.run().await?;

        assert_eq!(stats.funds, 1);
        assert_eq!(stats.portfolios, 2);

        let funds = store.list_funds().await?;
        assert_eq!(funds.len(), 1);
        // First occurrence wins.
        assert_eq!(funds[0].name, "First");
        assert_eq!(funds[0].category, "Equity");

        assert_eq!(store.list_holdings(100).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn missing_name_and_category_get_defaults() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_funds(vec![fund_row(serde_json::json!({
                "fund_code": 110022, "shares": 100, "cost": 1.5
            }))])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        pipeline.run().await?;

        let fund = store.get_fund("110022").await?.expect("fund upserted");
        assert_eq!(fund.name, DEFAULT_FUND_NAME);
        assert_eq!(fund.category, DEFAULT_FUND_CATEGORY);
        Ok(())
    }

    #[tokio::test]
    async fn total_cost_is_shares_times_cost_at_transform_time() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_funds(vec![fund_row(serde_json::json!({
                "fund_code": "F1", "shares": "100", "cost": "1.5"
            }))])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        pipeline.run().await?;

        let holdings = store.list_holdings(100).await?;
        assert_eq!(holdings[0].total_cost, "150");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_shares_fail_the_run_before_any_write() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_funds(vec![fund_row(serde_json::json!({
                "fund_code": "F1", "shares": "lots", "cost": "1.5"
            }))])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        let err = pipeline.run().await.unwrap_err();

        match err {
            IngestError::InvalidRow { collection, row, .. } => {
                assert_eq!(collection, "temp_funds");
                assert_eq!(row, 0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.list_funds().await?.is_empty());
        assert!(store.list_holdings(100).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn maps_trade_side_tokens_and_defaults() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_transactions(vec![
                txn_row(serde_json::json!({
                    "fund_code": "F1", "type": "买入", "date": "2024-03-01",
                    "shares": "10", "price": "1.5", "amount": "15", "note": "first lot"
                })),
                txn_row(serde_json::json!({
                    "fund_code": "F1", "type": "sell", "date": "2024-04-01", "shares": "5"
                })),
            ])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        let stats = pipeline.run().await?;
        assert_eq!(stats.transactions, 2);

        let txns = store.list_transactions(100).await?;
        assert_eq!(txns[0].side, TradeSide::Buy);
        assert_eq!(txns[0].note.as_deref(), Some("first lot"));
        assert_eq!(txns[1].side, TradeSide::Sell);
        assert_eq!(txns[1].price, "0");
        assert_eq!(txns[1].amount, "0");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_trade_side_rejects_by_default() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_transactions(vec![txn_row(serde_json::json!({
                "fund_code": "F1", "type": "transfer", "date": "2024-03-01", "shares": "10"
            }))])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        let err = pipeline.run().await.unwrap_err();

        match err {
            IngestError::UnknownTradeSide { code, token, .. } => {
                assert_eq!(code, "F1");
                assert_eq!(token, "transfer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.list_transactions(100).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn assume_sell_policy_preserves_legacy_behavior() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_transactions(vec![txn_row(serde_json::json!({
                "fund_code": "F1", "type": "transfer", "date": "2024-03-01", "shares": "10"
            }))])
            .await;

        let options = IngestOptions {
            unknown_trade_side: UnknownTradeSidePolicy::AssumeSell,
            ..IngestOptions::default()
        };
        let pipeline = IngestPipeline::new(store.clone(), options);
        pipeline.run().await?;

        let txns = store.list_transactions(100).await?;
        assert_eq!(txns[0].side, TradeSide::Sell);
        Ok(())
    }

    #[tokio::test]
    async fn rerun_converges_for_funds_and_duplicates_the_rest() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_staged_funds(vec![fund_row(serde_json::json!({
                "fund_code": "F1", "shares": "100", "cost": "1.5"
            }))])
            .await;
        store
            .seed_staged_transactions(vec![txn_row(serde_json::json!({
                "fund_code": "F1", "type": "buy", "date": "2024-03-01", "shares": "10"
            }))])
            .await;

        let pipeline = IngestPipeline::new(store.clone(), IngestOptions::default());
        pipeline.run().await?;
        pipeline.run().await?;

        // Upsert-by-code converges; unkeyed inserts double. The
        // duplication is current, documented behavior: changing it must
        // break this test.
        assert_eq!(store.list_funds().await?.len(), 1);
        assert_eq!(store.list_holdings(100).await?.len(), 2);
        assert_eq!(store.list_transactions(100).await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn staging_row_cap_bounds_each_collection() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let rows: Vec<_> = (0..30)
            .map(|i| {
                fund_row(serde_json::json!({
                    "fund_code": format!("F{i}"), "shares": "1", "cost": "1"
                }))
            })
            .collect();
        store.seed_staged_funds(rows).await;

        let options = IngestOptions {
            staging_row_cap: 10,
            ..IngestOptions::default()
        };
        let pipeline = IngestPipeline::new(store.clone(), options);
        let stats = pipeline.run().await?;

        assert_eq!(stats.portfolios, 10);
        Ok(())
    }
}
