use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ingest::UnknownTradeSidePolicy;

/// Read-path and write-path size bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Holdings fetched per dashboard refresh.
    pub holdings_page_size: usize,

    /// Rows read from each staging collection per ingestion run.
    pub staging_row_cap: usize,

    /// Records per concurrent write batch during ingestion.
    pub write_batch_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            holdings_page_size: 100,
            staging_row_cap: 1000,
            write_batch_size: 50,
        }
    }
}

/// Ingestion behavior toggles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// How to treat a trade-direction token the parser does not know.
    /// `reject` fails the run; `assume-sell` reproduces the legacy
    /// exporter's behavior and logs each converted row.
    pub unknown_trade_side: UnknownTradeSidePolicy,
}

fn default_base_price() -> Decimal {
    Decimal::new(15, 1)
}

fn default_max_swing_bps() -> i64 {
    200
}

/// Simulated quote feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    /// Baseline net value the synthetic feed fluctuates around.
    #[serde(default = "default_base_price")]
    pub base_price: Decimal,

    /// Maximum swing in basis points, applied in both directions.
    #[serde(default = "default_max_swing_bps")]
    pub max_swing_bps: i64,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            base_price: default_base_price(),
            max_swing_bps: default_max_swing_bps(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file
    /// location. If not specified, defaults to the config file's
    /// directory.
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub quotes: QuotesConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// If `data_dir` is set and relative, it's resolved relative to
    /// `config_dir`. If `data_dir` is not set, returns `config_dir`.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub limits: LimitsConfig,
    pub ingest: IngestConfig,
    pub quotes: QuotesConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./fundfolio.toml` if it exists in current directory
/// 2. `~/.local/share/fundfolio/fundfolio.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("fundfolio.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("fundfolio").join("fundfolio.toml");
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// The data directory is resolved relative to the config file's
    /// parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        let data_dir = config.resolve_data_dir(config_dir);

        Ok(Self {
            data_dir,
            limits: config.limits,
            ingest: config.ingest,
            quotes: config.quotes,
        })
    }

    /// Load config, creating a default if the file doesn't exist.
    ///
    /// If the config file doesn't exist, uses the config file's intended
    /// parent directory as the data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            Self::load(config_path)
        } else {
            let config_path = if config_path.is_relative() {
                std::env::current_dir()
                    .context("Failed to get current directory")?
                    .join(config_path)
            } else {
                config_path.to_path_buf()
            };

            let config_dir = config_path
                .parent()
                .context("Config path has no parent directory")?;

            Ok(Self {
                data_dir: config_dir.to_path_buf(),
                limits: LimitsConfig::default(),
                ingest: IngestConfig::default(),
                quotes: QuotesConfig::default(),
            })
        }
    }
}
