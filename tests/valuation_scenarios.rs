// tests/valuation_scenarios.rs
//
// Library-level scenarios exercising the full refresh path over the
// in-memory store with pinned quotes.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use fundfolio::clock::FixedClock;
use fundfolio::dashboard::DashboardService;
use fundfolio::models::{FundMetadata, Holding, Id, Quote};
use fundfolio::portfolio::PortfolioRepository;
use fundfolio::quotes::{QuoteProvider, StaticQuoteProvider};
use fundfolio::store::{MemoryStore, Store};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
    ))
}

async fn seed(store: &MemoryStore, code: &str, category: &str, shares: &str, cost: &str) {
    store
        .upsert_fund(&FundMetadata {
            code: code.to_string(),
            name: format!("Fund {code}"),
            category: category.to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        })
        .await
        .unwrap();
    store
        .insert_holding(&Holding {
            id: Id::new(),
            fund_code: code.to_string(),
            total_shares: shares.to_string(),
            avg_cost: cost.to_string(),
            total_cost: "0".to_string(),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        })
        .await
        .unwrap();
}

fn quote(code: &str, price: &str) -> Quote {
    Quote {
        fund_code: code.to_string(),
        price: Decimal::from_str(price).unwrap(),
        percent: Decimal::ZERO,
        as_of: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    }
}

fn service(store: Arc<MemoryStore>, provider: impl QuoteProvider + 'static) -> DashboardService {
    DashboardService::new(PortfolioRepository::new(store, 100), Arc::new(provider))
        .with_clock(clock())
}

#[tokio::test]
async fn gain_scenario_matches_expected_figures() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "F1", "Equity", "100", "1.0000").await;

    let svc = service(
        store,
        StaticQuoteProvider::new([quote("F1", "1.1000")]),
    );
    let json = serde_json::to_value(svc.refresh().await?)?;
    let row = &json["dashboardData"][0];

    assert_eq!(row["marketValue"], "110.00");
    assert_eq!(row["profit"], "10.00");
    assert_eq!(row["returnRate"], "10.00%");
    assert_eq!(row["isGain"], true);
    Ok(())
}

#[tokio::test]
async fn no_quote_scenario_shows_zero_unrealized_movement() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "F2", "Bond", "50", "2.0000").await;

    let svc = service(store, StaticQuoteProvider::default());
    let json = serde_json::to_value(svc.refresh().await?)?;
    let row = &json["dashboardData"][0];

    assert_eq!(row["price"], "2.0000");
    assert_eq!(row["profit"], "0.00");
    assert_eq!(row["returnRate"], "0.00%");
    Ok(())
}

#[tokio::test]
async fn same_category_holdings_merge_into_one_pie_slice() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "F1", "A", "30", "1").await;
    seed(&store, "F2", "A", "70", "1").await;

    let svc = service(store, StaticQuoteProvider::default());
    let json = serde_json::to_value(svc.refresh().await?)?;

    let pie = json["charts"]["pie"].as_array().unwrap();
    assert_eq!(pie.len(), 1);
    assert_eq!(pie[0]["name"], "A");
    assert_eq!(pie[0]["value"], "100.00");
    Ok(())
}

#[tokio::test]
async fn rows_come_back_in_holding_order() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    for code in ["F3", "F1", "F2", "F5", "F4"] {
        seed(&store, code, "Mixed", "1", "1").await;
    }

    let svc = service(store, StaticQuoteProvider::default());
    let json = serde_json::to_value(svc.refresh().await?)?;

    let codes: Vec<_> = json["dashboardData"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, ["F3", "F1", "F2", "F5", "F4"]);
    Ok(())
}

#[tokio::test]
async fn zero_cost_holding_reports_zero_return_rate() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "F1", "Equity", "0", "0").await;

    let svc = service(
        store,
        StaticQuoteProvider::new([quote("F1", "1.5")]),
    );
    let json = serde_json::to_value(svc.refresh().await?)?;

    assert_eq!(json["dashboardData"][0]["returnRate"], "0.00%");
    assert_eq!(json["summary"]["totalReturnRate"], "0.00%");
    Ok(())
}
