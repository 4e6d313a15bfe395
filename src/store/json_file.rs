use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::models::{FundMetadata, Holding, Id, RawFundRow, RawTransactionRow, Transaction};

use super::Store;

/// JSON file-backed store.
///
/// Directory structure:
/// ```text
/// data/
///   fund_basic/
///     {code}.json
///   user_portfolio.jsonl
///   fund_transactions.jsonl
///   temp_funds.jsonl
///   temp_transactions.jsonl
/// ```
///
/// Keyed documents are whole-file create-or-replace writes; unkeyed
/// collections are JSONL appends, so insertion order survives a
/// round-trip. Appends are serialized behind one lock so concurrent
/// batch writes cannot interleave partial lines.
pub struct JsonFileStore {
    base_path: PathBuf,
    append_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            append_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn funds_dir(&self) -> PathBuf {
        self.base_path.join("fund_basic")
    }

    fn fund_file(&self, code: &str) -> PathBuf {
        self.funds_dir().join(format!("{code}.json"))
    }

    fn holdings_file(&self) -> PathBuf {
        self.base_path.join("user_portfolio.jsonl")
    }

    fn transactions_file(&self) -> PathBuf {
        self.base_path.join("fund_transactions.jsonl")
    }

    fn staged_funds_file(&self) -> PathBuf {
        self.base_path.join("temp_funds.jsonl")
    }

    fn staged_transactions_file(&self) -> PathBuf {
        self.base_path.join("temp_transactions.jsonl")
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_json<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read file"),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_dir(path).await?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        fs::write(path, content)
            .await
            .context("Failed to write file")?;
        Ok(())
    }

    async fn read_jsonl<T: for<'de> serde::Deserialize<'de>>(
        &self,
        path: &Path,
        limit: usize,
    ) -> Result<Vec<T>> {
        let file = match fs::File::open(path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to open file"),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut items = Vec::new();

        while let Some(line) = lines.next_line().await.context("Failed to read line")? {
            if items.len() >= limit {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let item: T = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse JSONL line: {}", line))?;
            items.push(item);
        }

        Ok(items)
    }

    async fn append_jsonl_line<T: serde::Serialize>(&self, path: &Path, item: &T) -> Result<()> {
        let line = serde_json::to_string(item).context("Failed to serialize item")?;

        let _guard = self.append_lock.lock().await;
        self.ensure_dir(path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .context("Failed to open file for append")?;

        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;

        Ok(())
    }

    async fn list_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let mut entries = match fs::read_dir(path).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
            Err(e) => return Err(e).context("Failed to read directory"),
        };

        while let Some(entry) = entries.next_entry().await.context("Failed to read entry")? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path);
            }
        }

        Ok(files)
    }
}

#[async_trait::async_trait]
impl Store for JsonFileStore {
    async fn list_funds(&self) -> Result<Vec<FundMetadata>> {
        let mut funds = Vec::new();
        for path in self.list_files(&self.funds_dir()).await? {
            if let Some(fund) = self.read_json::<FundMetadata>(&path).await? {
                funds.push(fund);
            }
        }
        Ok(funds)
    }

    async fn get_fund(&self, code: &str) -> Result<Option<FundMetadata>> {
        if !Id::is_path_safe(code) {
            bail!("Fund code is not a safe document key: {code:?}");
        }
        self.read_json(&self.fund_file(code)).await
    }

    async fn upsert_fund(&self, fund: &FundMetadata) -> Result<()> {
        if !Id::is_path_safe(&fund.code) {
            bail!("Fund code is not a safe document key: {:?}", fund.code);
        }
        self.write_json(&self.fund_file(&fund.code), fund).await
    }

    async fn list_holdings(&self, limit: usize) -> Result<Vec<Holding>> {
        self.read_jsonl(&self.holdings_file(), limit).await
    }

    async fn insert_holding(&self, holding: &Holding) -> Result<()> {
        self.append_jsonl_line(&self.holdings_file(), holding).await
    }

    async fn list_transactions(&self, limit: usize) -> Result<Vec<Transaction>> {
        self.read_jsonl(&self.transactions_file(), limit).await
    }

    async fn insert_transaction(&self, txn: &Transaction) -> Result<()> {
        self.append_jsonl_line(&self.transactions_file(), txn).await
    }

    async fn staged_funds(&self, limit: usize) -> Result<Vec<RawFundRow>> {
        self.read_jsonl(&self.staged_funds_file(), limit).await
    }

    async fn staged_transactions(&self, limit: usize) -> Result<Vec<RawTransactionRow>> {
        self.read_jsonl(&self.staged_transactions_file(), limit).await
    }
}
