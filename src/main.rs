use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fundfolio::config::{default_config_path, ResolvedConfig};
use fundfolio::dashboard::{error_envelope, DashboardService};
use fundfolio::ingest::{IngestOptions, IngestPipeline};
use fundfolio::portfolio::PortfolioRepository;
use fundfolio::quotes::SimulatedQuoteProvider;
use fundfolio::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "fundfolio")]
#[command(about = "Fund portfolio valuation and staging-data ingestion")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the portfolio dashboard and print the response envelope
    Dashboard,
    /// Run the staging-data ingestion pipeline
    Ingest,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = ResolvedConfig::load_or_default(&config_path)?;

    match cli.command {
        Command::Dashboard => {
            let store = Arc::new(JsonFileStore::new(&config.data_dir));
            let repository = PortfolioRepository::new(store, config.limits.holdings_page_size);
            let quotes = Arc::new(SimulatedQuoteProvider::new(
                config.quotes.base_price,
                config.quotes.max_swing_bps,
            ));
            let service = DashboardService::new(repository, quotes);

            // All failures surface as the uniform {error} envelope; the
            // detail stays in the logs.
            let envelope = match service.refresh().await {
                Ok(response) => serde_json::to_value(&response)?,
                Err(err) => {
                    tracing::error!(error = ?err, "Dashboard refresh failed");
                    error_envelope(&err)
                }
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Ingest => {
            let store = Arc::new(JsonFileStore::new(&config.data_dir));
            let options = IngestOptions {
                staging_row_cap: config.limits.staging_row_cap,
                write_batch_size: config.limits.write_batch_size,
                unknown_trade_side: config.ingest.unknown_trade_side,
            };
            let pipeline = IngestPipeline::new(store, options);

            let envelope = match pipeline.run().await {
                Ok(stats) => serde_json::json!({
                    "success": true,
                    "msg": "Staging data migrated",
                    "stats": stats,
                }),
                Err(err) => {
                    let err = anyhow::Error::new(err);
                    tracing::error!(error = ?err, "Ingestion failed");
                    serde_json::json!({
                        "success": false,
                        "error": format!("{err:#}"),
                    })
                }
            };
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("Data directory: {}", config.data_dir.display());
        }
    }

    Ok(())
}
