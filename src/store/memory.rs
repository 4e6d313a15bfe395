//! In-memory store implementation for testing.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::models::{FundMetadata, Holding, RawFundRow, RawTransactionRow, Transaction};

use super::Store;

/// In-memory store for testing purposes.
///
/// Mirrors `JsonFileStore` semantics: funds are keyed by code and
/// replaced on upsert, holdings and transactions accumulate in insertion
/// order, staging rows are seeded once and never mutated.
#[derive(Default)]
pub struct MemoryStore {
    funds: Mutex<HashMap<String, FundMetadata>>,
    holdings: Mutex<Vec<Holding>>,
    transactions: Mutex<Vec<Transaction>>,
    staged_funds: Mutex<Vec<RawFundRow>>,
    staged_transactions: Mutex<Vec<RawTransactionRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_staged_funds(&self, rows: Vec<RawFundRow>) {
        *self.staged_funds.lock().await = rows;
    }

    pub async fn seed_staged_transactions(&self, rows: Vec<RawTransactionRow>) {
        *self.staged_transactions.lock().await = rows;
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn list_funds(&self) -> Result<Vec<FundMetadata>> {
        let funds = self.funds.lock().await;
        Ok(funds.values().cloned().collect())
    }

    async fn get_fund(&self, code: &str) -> Result<Option<FundMetadata>> {
        let funds = self.funds.lock().await;
        Ok(funds.get(code).cloned())
    }

    async fn upsert_fund(&self, fund: &FundMetadata) -> Result<()> {
        let mut funds = self.funds.lock().await;
        funds.insert(fund.code.clone(), fund.clone());
        Ok(())
    }

    async fn list_holdings(&self, limit: usize) -> Result<Vec<Holding>> {
        let holdings = self.holdings.lock().await;
        Ok(holdings.iter().take(limit).cloned().collect())
    }

    async fn insert_holding(&self, holding: &Holding) -> Result<()> {
        let mut holdings = self.holdings.lock().await;
        holdings.push(holding.clone());
        Ok(())
    }

    async fn list_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.lock().await;
        Ok(transactions.iter().take(limit).cloned().collect())
    }

    async fn insert_transaction(&self, txn: &Transaction) -> Result<()> {
        let mut transactions = self.transactions.lock().await;
        transactions.push(txn.clone());
        Ok(())
    }

    async fn staged_funds(&self, limit: usize) -> Result<Vec<RawFundRow>> {
        let rows = self.staged_funds.lock().await;
        Ok(rows.iter().take(limit).cloned().collect())
    }

    async fn staged_transactions(&self, limit: usize) -> Result<Vec<RawTransactionRow>> {
        let rows = self.staged_transactions.lock().await;
        Ok(rows.iter().take(limit).cloned().collect())
    }
}
