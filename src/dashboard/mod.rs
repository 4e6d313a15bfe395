//! Dashboard refresh: store → quotes → valuation → response envelope.
//!
//! The envelope keeps the wire names the mobile client already speaks
//! (camelCase, monetary fields as fixed-point strings). Computation
//! stays exact; everything here only renders.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::format::{format_amount, format_fixed, format_percent, format_price, round2};
use crate::portfolio::{value_portfolio, HoldingValuation, PortfolioRepository, PortfolioSummary};
use crate::quotes::QuoteProvider;

/// One holding, rendered for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRow {
    pub code: String,
    pub name: String,
    pub category: String,
    pub shares: String,
    pub cost: String,
    pub price: String,
    pub daily_percent: String,
    pub market_value: String,
    pub profit: String,
    pub return_rate: String,
    pub is_gain: bool,
    /// Quote as-of date; absent when the price fell back to cost basis.
    pub update_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub total_assets: String,
    pub total_profit: String,
    pub total_return_rate: String,
    pub is_gain: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub value: String,
}

/// Illustrative trend series. Not a historical computation; clients must
/// not read real performance out of it.
#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub dates: Vec<String>,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub pie: Vec<PieSlice>,
    pub line: LineSeries,
}

#[derive(Debug, Clone, Serialize)]
struct EmptyCharts {}

/// Distinct response shape for a portfolio with no holdings at all.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyDashboard {
    total_assets: String,
    dashboard_data: [DashboardRow; 0],
    charts: EmptyCharts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedDashboard {
    pub dashboard_data: Vec<DashboardRow>,
    pub summary: SummaryView,
    pub charts: ChartData,
}

/// Refresh result. The empty-portfolio case is deliberately its own
/// shape, not a populated envelope with zeroed fields.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DashboardResponse {
    Empty(EmptyDashboard),
    Populated(Box<PopulatedDashboard>),
}

impl DashboardResponse {
    fn empty() -> Self {
        Self::Empty(EmptyDashboard {
            total_assets: "0.00".to_string(),
            dashboard_data: [],
            charts: EmptyCharts {},
        })
    }
}

/// Uniform error envelope; no raw error ever escapes the boundary.
pub fn error_envelope(err: &anyhow::Error) -> serde_json::Value {
    serde_json::json!({ "error": format!("{err:#}") })
}

pub struct DashboardService {
    repository: PortfolioRepository,
    quotes: Arc<dyn QuoteProvider>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(repository: PortfolioRepository, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            repository,
            quotes,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn refresh(&self) -> Result<DashboardResponse> {
        let positions = self
            .repository
            .fetch_positions()
            .await
            .context("Failed to fetch holdings")?;

        if positions.is_empty() {
            tracing::debug!("No holdings; returning the empty dashboard");
            return Ok(DashboardResponse::empty());
        }

        // Distinct codes, in first-seen order: several lots of one fund
        // need only one quote.
        let mut seen = HashSet::new();
        let codes: Vec<String> = positions
            .iter()
            .map(|p| p.holding.fund_code.clone())
            .filter(|code| seen.insert(code.clone()))
            .collect();

        let quotes = self
            .quotes
            .fetch_quotes(&codes)
            .await
            .with_context(|| format!("Quote provider {:?} failed", self.quotes.name()))?;
        tracing::debug!(requested = codes.len(), received = quotes.len(), "Fetched quotes");

        let (valuations, summary) = value_portfolio(&positions, &quotes)?;

        let rows: Vec<DashboardRow> = valuations.iter().map(render_row).collect();
        let charts = ChartData {
            pie: render_pie(&summary),
            line: self.line_projection(summary.total_market_value),
        };

        Ok(DashboardResponse::Populated(Box::new(PopulatedDashboard {
            dashboard_data: rows,
            summary: SummaryView {
                total_assets: format_amount(summary.total_market_value),
                total_profit: format_amount(summary.total_profit),
                total_return_rate: format_percent(summary.total_return_rate),
                is_gain: summary.is_gain,
            },
            charts,
        })))
    }

    /// Seven-point projection of total assets ending today.
    fn line_projection(&self, total_market_value: Decimal) -> LineSeries {
        let today = self.clock.today();
        let base = round2(total_market_value);
        let mut dates = Vec::with_capacity(7);
        let mut values = Vec::with_capacity(7);

        for offset in (0..7).rev() {
            let date = today - Duration::days(offset);
            dates.push(date.format("%m-%d").to_string());
            let factor = Decimal::ONE - Decimal::new(5, 3) * Decimal::from(offset);
            values.push(format_amount(base * factor));
        }

        LineSeries { dates, values }
    }
}

fn render_row(valuation: &HoldingValuation) -> DashboardRow {
    DashboardRow {
        code: valuation.fund_code.clone(),
        name: valuation.name.clone(),
        category: valuation.category.clone(),
        shares: format_fixed(valuation.shares, 2),
        cost: format_price(valuation.cost_price),
        price: format_price(valuation.current_price),
        daily_percent: format_fixed(valuation.daily_percent, 2),
        market_value: format_amount(valuation.market_value),
        profit: format_amount(valuation.profit),
        return_rate: format_percent(valuation.return_rate),
        is_gain: valuation.is_gain,
        update_time: valuation.as_of.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

fn render_pie(summary: &PortfolioSummary) -> Vec<PieSlice> {
    summary
        .allocation
        .rollup()
        .into_iter()
        .map(|slice| PieSlice {
            name: slice.category,
            value: format_amount(slice.value),
        })
        .collect()
}
