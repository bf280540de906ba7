//! The single-writer executor: one task owns the book and the snapshot
//! store, reached through a `tokio::sync::mpsc` command channel so every
//! mutating call is serialized by construction instead of by a lock.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use uuid::Uuid;

use crate::bbo::{Bbo, DepthSnapshot};
use crate::book::OrderBook;
use crate::error::EngineError;
use crate::matcher::{self, Fill};
use crate::order::{self, NewOrder, Order, OrderType, TimeInForce};
use crate::snapshot::Store;
use crate::trade::Trade;
use rust_decimal::Decimal;

/// Outcome of submitting an order, mirroring the source system's status
/// rules verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Filled,
    Partial,
    AddedToBook,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct SubmitAck {
    pub order_id: String,
    pub status: SubmitStatus,
    pub filled_quantity: Decimal,
}

enum Command {
    Submit {
        order: NewOrder,
        reply: oneshot::Sender<Result<SubmitAck, EngineError>>,
    },
    Cancel {
        order_id: String,
        reply: oneshot::Sender<bool>,
    },
    Trades {
        reply: oneshot::Sender<Vec<Trade>>,
    },
    TopOfBook {
        reply: oneshot::Sender<Bbo>,
    },
    Depth {
        reply: oneshot::Sender<DepthSnapshot>,
    },
}

/// A cheap, cloneable handle to the executor task. This is the thing a
/// transport layer (HTTP, WS, or this crate's own CLI) would hold.
#[derive(Clone)]
pub struct Engine {
    tx: mpsc::Sender<Command>,
}

pub struct EngineConfig {
    pub symbol: String,
    pub snapshot_dir: std::path::PathBuf,
    pub channel_capacity: usize,
}

impl Engine {
    /// Recovers the book from the snapshot directory (or starts empty if
    /// none exists), then spawns the single executor task and returns a
    /// handle to it.
    pub async fn start(config: EngineConfig) -> Self {
        let store = Store::new(config.snapshot_dir);
        let (book, trades) = store.recover(&config.symbol).await;
        info!(symbol = %config.symbol, resting_bids = ?book.bids.depth(order::Side::Buy).len(), resting_asks = ?book.asks.depth(order::Side::Sell).len(), trades = trades.len(), "engine recovered");

        let (tx, rx) = mpsc::channel(config.channel_capacity);
        tokio::spawn(run(book, trades, store, rx));
        Self { tx }
    }

    pub async fn submit_order(&self, order: NewOrder) -> Result<SubmitAck, EngineError> {
        let (reply, recv) = oneshot::channel();
        let _ = self.tx.send(Command::Submit { order, reply }).await;
        recv.await.expect("engine task dropped the reply channel")
    }

    pub async fn cancel_order(&self, order_id: impl Into<String>) -> bool {
        let (reply, recv) = oneshot::channel();
        let _ = self
            .tx
            .send(Command::Cancel {
                order_id: order_id.into(),
                reply,
            })
            .await;
        recv.await.unwrap_or(false)
    }

    pub async fn trades(&self) -> Vec<Trade> {
        let (reply, recv) = oneshot::channel();
        let _ = self.tx.send(Command::Trades { reply }).await;
        recv.await.unwrap_or_default()
    }

    pub async fn top_of_book(&self) -> Bbo {
        let (reply, recv) = oneshot::channel();
        let _ = self.tx.send(Command::TopOfBook { reply }).await;
        recv.await.unwrap_or_else(|_| Bbo::empty())
    }

    pub async fn depth(&self) -> DepthSnapshot {
        let (reply, recv) = oneshot::channel();
        let _ = self.tx.send(Command::Depth { reply }).await;
        recv.await.unwrap_or_else(|_| DepthSnapshot {
            bbo: Bbo::empty(),
            bids: Vec::new(),
            asks: Vec::new(),
        })
    }
}

/// The executor loop. Drains `rx` strictly in receipt order; every
/// mutating command runs to completion, including the snapshot write,
/// before the next one is even looked at.
async fn run(mut book: OrderBook, mut trades: Vec<Trade>, store: Store, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Submit { order, reply } => {
                let outcome = submit(&mut book, &mut trades, order);
                if outcome.is_ok() {
                    if let Err(err) = store.persist(&book, &trades).await {
                        warn!(error = %err, "failed to persist snapshot after submit");
                    }
                }
                let _ = reply.send(outcome);
            }
            Command::Cancel { order_id, reply } => {
                let removed = book.cancel(&order_id);
                if removed {
                    book.recompute_bbo();
                    if let Err(err) = store.persist(&book, &trades).await {
                        warn!(error = %err, "failed to persist snapshot after cancel");
                    }
                }
                let _ = reply.send(removed);
            }
            Command::Trades { reply } => {
                let _ = reply.send(trades.clone());
            }
            Command::TopOfBook { reply } => {
                let _ = reply.send(book.bbo);
            }
            Command::Depth { reply } => {
                let _ = reply.send(book.depth_snapshot());
            }
        }
    }
}

/// Applies one inbound order end to end: TIF expiry gate, field
/// validation, matching, and resting the residual if applicable. Returns
/// the ack the submitter sees; never panics on expected conditions.
fn submit(
    book: &mut OrderBook,
    trades: &mut Vec<Trade>,
    new_order: NewOrder,
) -> Result<SubmitAck, EngineError> {
    let order_id = Uuid::new_v4().to_string();
    let arrival_time = Utc::now();

    if is_expired_on_arrival(&new_order, arrival_time) {
        return Ok(SubmitAck {
            order_id,
            status: SubmitStatus::Rejected,
            filled_quantity: Decimal::ZERO,
        });
    }

    order::validate(&new_order, &book.symbol)?;

    let mut order = Order {
        id: order_id.clone(),
        symbol: new_order.symbol,
        side: new_order.side,
        order_type: new_order.order_type,
        original_quantity: new_order.quantity,
        remaining_quantity: new_order.quantity,
        price: new_order.price,
        arrival_time,
        time_in_force: new_order.time_in_force,
        expiry: new_order.expiry,
    };

    let fill = match order.order_type {
        OrderType::Fok => Fill::AllOrNothing,
        _ => Fill::Partial,
    };
    let outcome = matcher::match_order(book, &mut order, fill);
    trades.extend(outcome.trades);
    book.recompute_bbo();

    let status = if order.is_fully_filled() {
        SubmitStatus::Filled
    } else if outcome.filled_quantity > Decimal::ZERO {
        SubmitStatus::Partial
    } else if order.order_type.rests_on_book() {
        SubmitStatus::AddedToBook
    } else {
        SubmitStatus::Rejected
    };

    if order.order_type.rests_on_book() && !order.is_fully_filled() {
        book.insert(order);
        book.recompute_bbo();
    }

    Ok(SubmitAck {
        order_id,
        status,
        filled_quantity: outcome.filled_quantity,
    })
}

/// DAY orders expire at 23:59:59 UTC of their own arrival day; GTD orders
/// expire at their explicit `expiry`. An order that is already expired at
/// the moment it arrives is accepted and rejected with zero fill, not
/// turned away before validation — this mirrors the source system's
/// contract, not a bug to fix.
fn is_expired_on_arrival(new_order: &NewOrder, arrival_time: DateTime<Utc>) -> bool {
    match new_order.time_in_force {
        TimeInForce::Gtc => false,
        TimeInForce::Day => {
            let day_end = arrival_time
                .date_naive()
                .and_hms_opt(23, 59, 59)
                .expect("23:59:59 is always a valid time")
                .and_utc();
            arrival_time > day_end
        }
        TimeInForce::Gtd => match new_order.expiry {
            Some(expiry) => arrival_time > expiry,
            None => false,
        },
    }
}
