//! NDJSON persistence: three append-style logs (bids, asks, trades),
//! each rewritten in full after every mutating engine operation.
//!
//! This mirrors a key/value store only in spirit — there is no indexed
//! store here, just whole-file writes, which is enough for a single-symbol
//! book and keeps recovery to "read three files, skip bad lines."

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use crate::book::OrderBook;
use crate::order::{Order, Side};
use crate::trade::Trade;

const BIDS_FILE: &str = "bids.ndjson";
const ASKS_FILE: &str = "asks.ndjson";
const TRADES_FILE: &str = "trades.ndjson";

/// Owns the snapshot directory and performs the full-rewrite-per-mutation
/// persistence strategy.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Creates the snapshot directory if it does not already exist.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Rewrites `bids.ndjson` and `asks.ndjson` from the book's current
    /// resting orders, and appends-by-rewrite `trades.ndjson` from the
    /// book's full trade journal. Called once per mutating engine command,
    /// after the command has been fully applied in memory.
    pub async fn persist(&self, book: &OrderBook, trades: &[Trade]) -> std::io::Result<()> {
        self.ensure_dir().await?;
        self.write_side(BIDS_FILE, book, Side::Buy).await?;
        self.write_side(ASKS_FILE, book, Side::Sell).await?;
        self.write_trades(trades).await
    }

    async fn write_side(&self, file: &str, book: &OrderBook, side: Side) -> std::io::Result<()> {
        let mut buf = String::new();
        for price in book.side(side).prices_best_first(side) {
            let Some(level) = book.side(side).level(price) else {
                continue;
            };
            for order in level {
                buf.push_str(&serde_json::to_string(order)?);
                buf.push('\n');
            }
        }
        fs::write(self.path(file), buf).await
    }

    async fn write_trades(&self, trades: &[Trade]) -> std::io::Result<()> {
        let mut buf = String::new();
        for trade in trades {
            buf.push_str(&serde_json::to_string(trade)?);
            buf.push('\n');
        }
        fs::write(self.path(TRADES_FILE), buf).await
    }

    /// Rebuilds a book from the three NDJSON logs. A missing directory or
    /// missing files yield an empty book, not an error: there is nothing to
    /// recover on first run. Lines that fail to parse are skipped with a
    /// warning; recovery continues with the remaining lines. Restores the
    /// bids/asks resting orders and the trade journal, then recomputes BBO.
    pub async fn recover(&self, symbol: &str) -> (OrderBook, Vec<Trade>) {
        let mut book = OrderBook::new(symbol);
        load_side(&self.path(BIDS_FILE), &mut book, Side::Buy).await;
        load_side(&self.path(ASKS_FILE), &mut book, Side::Sell).await;
        book.recompute_bbo();
        let trades = load_trades(&self.path(TRADES_FILE)).await;
        (book, trades)
    }
}

async fn load_side(path: &Path, book: &mut OrderBook, side: Side) {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read snapshot file, starting empty for this side");
            return;
        }
    };
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Order>(line) {
            Ok(order) if order.side == side => book.insert(order),
            Ok(_) => warn!(path = %path.display(), lineno, "order on wrong side of its own file, skipping"),
            Err(err) => warn!(path = %path.display(), lineno, error = %err, "corrupt order line, skipping"),
        }
    }
}

async fn load_trades(path: &Path) -> Vec<Trade> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read trade log, starting empty");
            return Vec::new();
        }
    };
    let mut trades = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Trade>(line) {
            Ok(trade) => trades.push(trade),
            Err(err) => warn!(path = %path.display(), lineno, error = %err, "corrupt trade line, skipping"),
        }
    }
    trades
}
