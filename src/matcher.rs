//! Price/time crossing, with optional all-or-nothing (FOK) rollback.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::book::OrderBook;
use crate::order::{Order, OrderType, Side};
use crate::trade::Trade;

/// One entry in the rollback log: enough to undo either a quantity
/// decrement or a full eviction of a maker from its level.
enum RollbackEntry {
    /// A maker had its remaining quantity reduced; restore it.
    QuantityRestored {
        order_id: String,
        remaining_before: Decimal,
    },
    /// The maker was fully consumed and popped off the level; reinsert it
    /// at the head (recreating the level if it no longer exists).
    Evicted { order: Order },
}

/// Outcome of running the matcher against one taker.
pub struct MatchOutcome {
    pub filled_quantity: Decimal,
    pub trades: Vec<Trade>,
}

/// Whether the match must be all-or-nothing (FOK) or may fill partially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Partial,
    AllOrNothing,
}

fn price_acceptable(taker: &Order, level_price: Decimal) -> bool {
    match taker.order_type {
        OrderType::Market => true,
        _ => match taker.side {
            Side::Buy => taker.price >= level_price,
            Side::Sell => taker.price <= level_price,
        },
    }
}

/// Runs the matcher for `taker` against `book`'s opposite side.
///
/// For `Fill::AllOrNothing`, the pass is provisional: if the taker cannot
/// be filled completely, every captured rollback entry is replayed in
/// reverse and zero trades are returned, leaving the book bit-identical to
/// its pre-call state.
pub fn match_order(book: &mut OrderBook, taker: &mut Order, fill: Fill) -> MatchOutcome {
    let opposite = taker.side.opposite();
    let original_remaining = taker.remaining_quantity;
    let mut trades = Vec::new();
    let mut rollback: Vec<RollbackEntry> = Vec::new();
    let mut emptied_levels: Vec<Decimal> = Vec::new();

    info!(taker_id = %taker.id, side = ?taker.side, "matching order");

    let symbol = book.symbol.clone();
    let prices = book.side(opposite).prices_best_first(opposite);

    'outer: for price in prices {
        if taker.remaining_quantity.is_zero() {
            break;
        }
        if !price_acceptable(taker, price) {
            break 'outer;
        }

        loop {
            if taker.remaining_quantity.is_zero() {
                break;
            }
            let Some(level) = book.side_mut(opposite).level_mut(price) else {
                break;
            };
            let Some(maker) = level.front_mut() else {
                break;
            };

            let trade_qty = taker.remaining_quantity.min(maker.remaining_quantity);
            let maker_remaining_before = maker.remaining_quantity;

            taker.remaining_quantity -= trade_qty;
            maker.remaining_quantity -= trade_qty;

            trades.push(Trade {
                timestamp: Utc::now(),
                symbol: symbol.clone(),
                price,
                quantity: trade_qty,
                maker_order_id: maker.id.clone(),
                taker_order_id: taker.id.clone(),
                aggressor_side: taker.side,
            });

            if maker.is_fully_filled() {
                let filled_maker = level.pop_front().expect("front just matched");
                book.forget(&filled_maker.id);
                rollback.push(RollbackEntry::Evicted { order: filled_maker });
            } else {
                rollback.push(RollbackEntry::QuantityRestored {
                    order_id: maker.id.clone(),
                    remaining_before: maker_remaining_before,
                });
            }

            let emptied = book
                .side(opposite)
                .level(price)
                .is_some_and(|level| level.is_empty());
            if emptied {
                emptied_levels.push(price);
                break;
            }
        }
    }

    let filled_quantity = original_remaining - taker.remaining_quantity;

    if fill == Fill::AllOrNothing && filled_quantity < original_remaining {
        warn!(taker_id = %taker.id, "FOK could not fully fill, rolling back");
        rollback_match(book, taker, original_remaining, rollback);
        return MatchOutcome {
            filled_quantity: Decimal::ZERO,
            trades: Vec::new(),
        };
    }

    for price in emptied_levels {
        book.side_mut(opposite).remove_level_if_empty(price);
    }

    MatchOutcome {
        filled_quantity,
        trades,
    }
}

fn rollback_match(
    book: &mut OrderBook,
    taker: &mut Order,
    original_remaining: Decimal,
    rollback: Vec<RollbackEntry>,
) {
    taker.remaining_quantity = original_remaining;
    let opposite = taker.side.opposite();

    // Replay in reverse so evictions are undone most-recent-first, which
    // restores head-of-queue ordering within each level.
    for entry in rollback.into_iter().rev() {
        match entry {
            RollbackEntry::QuantityRestored {
                order_id,
                remaining_before,
                ..
            } => {
                match book.side_mut(opposite).find_order_mut(&order_id) {
                    Some(order) => order.remaining_quantity = remaining_before,
                    None => crate::book::invariant_violation(
                        "rollback could not find maker to restore quantity",
                    ),
                }
            }
            RollbackEntry::Evicted { order } => {
                book.reinsert_at_head(order);
            }
        }
    }
}
