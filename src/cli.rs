//! `clap`-based operator console: a local binary for driving one engine
//! instance directly, in place of the network transport this crate does
//! not implement.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::info;

use crate::engine::{Engine, SubmitStatus};
use crate::order::{NewOrder, OrderType, Side, TimeInForce};

#[derive(Parser)]
#[command(name = "engine-cli")]
#[command(version = "0.1", about = "A single-symbol limit order book console")]
pub struct Cli {
    /// Symbol this engine instance trades, e.g. BTC-USD.
    #[arg(long, global = true, default_value = "BTC-USD")]
    pub symbol: String,

    /// Directory holding the bids/asks/trades NDJSON logs.
    #[arg(long, global = true, default_value = "snapshot")]
    pub snapshot_dir: std::path::PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SideArg {
    Buy,
    Sell,
}

impl From<SideArg> for Side {
    fn from(value: SideArg) -> Self {
        match value {
            SideArg::Buy => Side::Buy,
            SideArg::Sell => Side::Sell,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OrderTypeArg {
    Market,
    Limit,
    Ioc,
    Fok,
}

impl From<OrderTypeArg> for OrderType {
    fn from(value: OrderTypeArg) -> Self {
        match value {
            OrderTypeArg::Market => OrderType::Market,
            OrderTypeArg::Limit => OrderType::Limit,
            OrderTypeArg::Ioc => OrderType::Ioc,
            OrderTypeArg::Fok => OrderType::Fok,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TifArg {
    Gtc,
    Day,
    Gtd,
}

impl From<TifArg> for TimeInForce {
    fn from(value: TifArg) -> Self {
        match value {
            TifArg::Gtc => TimeInForce::Gtc,
            TifArg::Day => TimeInForce::Day,
            TifArg::Gtd => TimeInForce::Gtd,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a new order.
    Submit {
        #[arg(value_enum)]
        side: SideArg,
        #[arg(value_enum)]
        order_type: OrderTypeArg,
        /// Quantity, must be > 0.
        quantity: Decimal,
        /// Price; required for limit/ioc/fok, ignored for market.
        #[arg(default_value = "0")]
        price: Decimal,
        #[arg(long, value_enum, default_value = "gtc")]
        tif: TifArg,
        /// RFC3339 expiry, required when --tif gtd.
        #[arg(long)]
        expiry: Option<DateTime<Utc>>,
    },
    /// Cancel a resting order by id.
    Cancel { order_id: String },
    /// Print the current book (BBO + per-price depth).
    Book,
    /// Print the full executed trade journal.
    Trades,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let engine = Engine::start(crate::engine::EngineConfig {
        symbol: cli.symbol.clone(),
        snapshot_dir: cli.snapshot_dir.clone(),
        channel_capacity: 32,
    })
    .await;

    match cli.command {
        Commands::Submit {
            side,
            order_type,
            quantity,
            price,
            tif,
            expiry,
        } => {
            let new_order = NewOrder {
                symbol: cli.symbol.clone(),
                side: side.into(),
                order_type: order_type.into(),
                quantity,
                price,
                time_in_force: tif.into(),
                expiry,
            };
            let ack = engine.submit_order(new_order).await?;
            print_ack(&ack);
        }
        Commands::Cancel { order_id } => {
            let cancelled = engine.cancel_order(order_id.clone()).await;
            if cancelled {
                println!("cancelled {order_id}");
            } else {
                println!("no resting order with id {order_id}");
            }
        }
        Commands::Book => print_book(&engine).await,
        Commands::Trades => print_trades(&engine).await,
    }
    Ok(())
}

fn print_ack(ack: &crate::engine::SubmitAck) {
    let status = match ack.status {
        SubmitStatus::Filled => "filled",
        SubmitStatus::Partial => "partial",
        SubmitStatus::AddedToBook => "added to book",
        SubmitStatus::Rejected => "rejected",
    };
    println!(
        "order {}: {} (filled {})",
        ack.order_id, status, ack.filled_quantity
    );
    info!(order_id = %ack.order_id, status, filled = %ack.filled_quantity, "submit complete");
}

async fn print_book(engine: &Engine) {
    let depth = engine.depth().await;
    println!("------ order book ------");
    println!(
        "best bid: {} @ {}  |  best offer: {} @ {}",
        depth.bbo.best_bid_quantity,
        depth.bbo.best_bid_price,
        depth.bbo.best_offer_quantity,
        depth.bbo.best_offer_price
    );
    println!("bids (highest first):");
    for level in &depth.bids {
        println!("  {} @ {}", level.quantity, level.price);
    }
    println!("asks (lowest first):");
    for level in &depth.asks {
        println!("  {} @ {}", level.quantity, level.price);
    }
    println!("-------------------------");
}

async fn print_trades(engine: &Engine) {
    let trades = engine.trades().await;
    if trades.is_empty() {
        println!("no trades executed yet");
        return;
    }
    for trade in trades {
        println!(
            "{} {} {} @ {} maker={} taker={} aggressor={:?}",
            trade.timestamp,
            trade.symbol,
            trade.quantity,
            trade.price,
            trade.maker_order_id,
            trade.taker_order_id,
            trade.aggressor_side
        );
    }
}
