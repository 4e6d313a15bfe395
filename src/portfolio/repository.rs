use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::models::FundMetadata;
use crate::store::Store;

use super::models::PositionRecord;

/// Reads the user's holdings joined with static fund metadata.
///
/// Holdings come back in stored order, which downstream code preserves
/// end-to-end as the display order. The page size bounds how many
/// holdings a single valuation request will touch.
pub struct PortfolioRepository {
    store: Arc<dyn Store>,
    page_size: usize,
}

impl PortfolioRepository {
    pub fn new(store: Arc<dyn Store>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    pub async fn fetch_positions(&self) -> Result<Vec<PositionRecord>> {
        let holdings = self.store.list_holdings(self.page_size).await?;
        if holdings.is_empty() {
            return Ok(Vec::new());
        }

        let funds: HashMap<String, FundMetadata> = self
            .store
            .list_funds()
            .await?
            .into_iter()
            .map(|fund| (fund.code.clone(), fund))
            .collect();

        Ok(holdings
            .into_iter()
            .map(|holding| {
                let fund = funds.get(&holding.fund_code).cloned();
                PositionRecord { holding, fund }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Holding, Id};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn holding(code: &str) -> Holding {
        Holding {
            id: Id::new(),
            fund_code: code.to_string(),
            total_shares: "1".to_string(),
            avg_cost: "1".to_string(),
            total_cost: "1".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn joins_metadata_by_fund_code() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_fund(&FundMetadata {
                code: "F1".to_string(),
                name: "Index Growth".to_string(),
                category: "Equity".to_string(),
                updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            })
            .await?;
        store.insert_holding(&holding("F1")).await?;
        store.insert_holding(&holding("F2")).await?;

        let repo = PortfolioRepository::new(store, 100);
        let positions = repo.fetch_positions().await?;

        assert_eq!(positions.len(), 2);
        assert_eq!(
            positions[0].fund.as_ref().map(|f| f.name.as_str()),
            Some("Index Growth")
        );
        assert!(positions[1].fund.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn respects_the_page_size() -> Result<()> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..5 {
            store.insert_holding(&holding(&format!("F{i}"))).await?;
        }

        let repo = PortfolioRepository::new(store, 3);
        let positions = repo.fetch_positions().await?;
        assert_eq!(positions.len(), 3);
        Ok(())
    }
}
