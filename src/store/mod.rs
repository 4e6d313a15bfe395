mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use anyhow::Result;

use crate::models::{FundMetadata, Holding, RawFundRow, RawTransactionRow, Transaction};

/// Document-store abstraction over the logical collections.
///
/// `fund_basic` is keyed by fund code and written with create-or-replace
/// semantics. `user_portfolio` and `fund_transactions` take
/// system-generated keys and only ever grow; their listing order is
/// insertion order, which is also the display order. The staging
/// collections are consumed by ingestion and never mutated here.
///
/// There are no cross-record transactions: callers may rely on per-record
/// atomicity only.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // fund_basic
    async fn list_funds(&self) -> Result<Vec<FundMetadata>>;
    async fn get_fund(&self, code: &str) -> Result<Option<FundMetadata>>;
    async fn upsert_fund(&self, fund: &FundMetadata) -> Result<()>;

    // user_portfolio
    async fn list_holdings(&self, limit: usize) -> Result<Vec<Holding>>;
    async fn insert_holding(&self, holding: &Holding) -> Result<()>;

    // fund_transactions
    async fn list_transactions(&self, limit: usize) -> Result<Vec<Transaction>>;
    async fn insert_transaction(&self, txn: &Transaction) -> Result<()>;

    // temp_funds / temp_transactions
    async fn staged_funds(&self, limit: usize) -> Result<Vec<RawFundRow>>;
    async fn staged_transactions(&self, limit: usize) -> Result<Vec<RawTransactionRow>>;
}
