use crate::DbError;
use async_trait::async_trait;
use core_types::{Trade, TradePatch};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persistence seam for trade records.
///
/// The engine writes through this trait only; a trade store on disk, in a
/// database or in memory is interchangeable.
#[async_trait]
pub trait TradeRepository: Send + Sync {
    /// Stores a newly opened trade. Returns `false` when a trade with the same
    /// id is already stored, in which case nothing is written.
    async fn record_trade(&self, trade: &Trade) -> Result<bool, DbError>;

    /// Applies the closing fields to a stored trade.
    async fn update_trade(
        &self,
        symbol: &str,
        exchange: &str,
        id: &str,
        patch: &TradePatch,
    ) -> Result<(), DbError>;

    /// Every trade of `exchange` whose status is still open.
    async fn load_open_trades(&self, exchange: &str) -> Result<Vec<Trade>, DbError>;

    /// Trade history of `exchange`, optionally narrowed to one symbol, oldest first.
    async fn load_trades(&self, exchange: &str, symbol: Option<&str>)
    -> Result<Vec<Trade>, DbError>;
}

/// Trade store backed by one CSV file per symbol: `<root>/<exchange>/<symbol>.csv`.
#[derive(Debug, Clone)]
pub struct CsvTradeRepository {
    root: PathBuf,
}

impl CsvTradeRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn exchange_dir(&self, exchange: &str) -> Result<PathBuf, DbError> {
        Ok(self.root.join(storage_key(exchange)?))
    }

    fn symbol_file(&self, exchange: &str, symbol: &str) -> Result<PathBuf, DbError> {
        Ok(self
            .exchange_dir(exchange)?
            .join(format!("{}.csv", storage_key(symbol)?)))
    }
}

/// Names become path components, so only a conservative character set is accepted.
fn storage_key(name: &str) -> Result<&str, DbError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(DbError::InvalidKey(name.to_string()))
    }
}

fn read_trades(path: &Path) -> Result<Vec<Trade>, DbError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let trades = reader.deserialize().collect::<Result<Vec<Trade>, _>>()?;
    Ok(trades)
}

fn append_trade(path: &Path, trade: &Trade) -> Result<(), DbError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let needs_header = !path.exists();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(trade)?;
    writer.flush()?;
    Ok(())
}

/// Rewrites the whole file through a sibling temp file, so a crash never
/// leaves a half-written history behind.
fn rewrite_trades(path: &Path, trades: &[Trade]) -> Result<(), DbError> {
    let staging = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&staging)?;
        for trade in trades {
            writer.serialize(trade)?;
        }
        writer.flush()?;
    }
    fs::rename(&staging, path)?;
    Ok(())
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, DbError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

async fn blocking<T, F>(job: F) -> Result<T, DbError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DbError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| DbError::Task(e.to_string()))?
}

#[async_trait]
impl TradeRepository for CsvTradeRepository {
    async fn record_trade(&self, trade: &Trade) -> Result<bool, DbError> {
        let path = self.symbol_file(&trade.exchange, &trade.symbol)?;
        let trade = trade.clone();

        blocking(move || {
            if read_trades(&path)?.iter().any(|t| t.id == trade.id) {
                warn!(id = %trade.id, symbol = %trade.symbol, "Trade already recorded; skipping.");
                return Ok(false);
            }
            append_trade(&path, &trade)?;
            debug!(id = %trade.id, file = %path.display(), "Recorded trade.");
            Ok(true)
        })
        .await
    }

    async fn update_trade(
        &self,
        symbol: &str,
        exchange: &str,
        id: &str,
        patch: &TradePatch,
    ) -> Result<(), DbError> {
        let path = self.symbol_file(exchange, symbol)?;
        let (symbol, exchange, id, patch) = (
            symbol.to_string(),
            exchange.to_string(),
            id.to_string(),
            patch.clone(),
        );

        blocking(move || {
            let mut trades = read_trades(&path)?;
            let Some(trade) = trades.iter_mut().find(|t| t.id == id) else {
                return Err(DbError::NotFound {
                    exchange,
                    symbol,
                    id,
                });
            };
            trade.apply(&patch);
            rewrite_trades(&path, &trades)?;
            debug!(%id, status = %patch.status, "Updated trade.");
            Ok(())
        })
        .await
    }

    async fn load_open_trades(&self, exchange: &str) -> Result<Vec<Trade>, DbError> {
        let mut trades = self.load_trades(exchange, None).await?;
        trades.retain(Trade::is_open);
        Ok(trades)
    }

    async fn load_trades(
        &self,
        exchange: &str,
        symbol: Option<&str>,
    ) -> Result<Vec<Trade>, DbError> {
        let files = match symbol {
            Some(symbol) => vec![self.symbol_file(exchange, symbol)?],
            None => {
                let dir = self.exchange_dir(exchange)?;
                blocking(move || csv_files(&dir)).await?
            }
        };

        blocking(move || {
            let mut trades = Vec::new();
            for file in &files {
                trades.extend(read_trades(file)?);
            }
            trades.sort_by_key(|t| t.open_time);
            Ok(trades)
        })
        .await
    }
}
