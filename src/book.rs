//! The book side data structure: price-indexed FIFO queues plus the order
//! index that must stay in lockstep with them.

use std::collections::{BTreeMap, HashMap, VecDeque};

use rust_decimal::Decimal;
use tracing::warn;

use crate::bbo::{Bbo, DepthLevel, DepthSnapshot};
use crate::order::{Order, Side};

/// A FIFO queue of orders resting at a single price. Every order in here
/// shares the same price and side; the head is the oldest still-resting
/// order.
pub type PriceLevel = VecDeque<Order>;

/// One side of the book: an ordered price -> level mapping. Iteration order
/// on `bids` only makes sense reversed (highest price first); `asks` read
/// naturally ascending (lowest price first).
#[derive(Debug, Default)]
pub struct BookSide {
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl BookSide {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn best_price(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    pub fn level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    pub fn push_back(&mut self, price: Decimal, order: Order) {
        self.levels.entry(price).or_default().push_back(order);
    }

    pub fn push_front(&mut self, price: Decimal, order: Order) {
        self.levels.entry(price).or_default().push_front(order);
    }

    /// Snapshot of price keys, best-to-worst for `side` (descending for
    /// bids, ascending for asks). Taken up front so the matcher can walk
    /// prices while mutating individual levels through `level_mut`.
    pub fn prices_best_first(&self, side: Side) -> Vec<Decimal> {
        match side {
            Side::Buy => self.levels.keys().rev().copied().collect(),
            Side::Sell => self.levels.keys().copied().collect(),
        }
    }

    pub fn level_mut(&mut self, price: Decimal) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    pub fn remove_level_if_empty(&mut self, price: Decimal) {
        if self.levels.get(&price).is_some_and(VecDeque::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Linear scan for rollback only: finds a resting order by id regardless
    /// of price level.
    pub fn find_order_mut(&mut self, order_id: &str) -> Option<&mut Order> {
        self.levels
            .values_mut()
            .find_map(|level| level.iter_mut().find(|o| o.id == order_id))
    }

    pub fn depth(&self, side: Side) -> Vec<DepthLevel> {
        let mut out: Vec<DepthLevel> = self
            .levels
            .iter()
            .map(|(price, level)| DepthLevel {
                price: *price,
                quantity: level.iter().map(|o| o.remaining_quantity).sum(),
            })
            .collect();
        if side == Side::Buy {
            out.reverse();
        }
        out
    }

    fn top(&self, side: Side) -> (Decimal, Decimal) {
        match self.best_price(side) {
            None => (Decimal::ZERO, Decimal::ZERO),
            Some(price) => {
                let qty = self
                    .level(price)
                    .map(|level| level.iter().map(|o| o.remaining_quantity).sum())
                    .unwrap_or(Decimal::ZERO);
                (price, qty)
            }
        }
    }
}

/// The single-symbol book: both sides plus the order index that lets
/// cancellation find an order's side/price in O(1) before the O(k) scan
/// within its level.
#[derive(Debug)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: BookSide,
    pub asks: BookSide,
    index: HashMap<String, (Side, Decimal)>,
    pub bbo: Bbo,
}

impl OrderBook {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BookSide::default(),
            asks: BookSide::default(),
            index: HashMap::new(),
            bbo: Bbo::empty(),
        }
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rests an order at the tail of its price level and registers it in
    /// the index. Caller is responsible for only calling this with orders
    /// that should rest (limit residuals; never market/IOC/FOK).
    pub fn insert(&mut self, order: Order) {
        let price = order.price;
        let side = order.side;
        self.index.insert(order.id.clone(), (side, price));
        self.side_mut(side).push_back(price, order);
    }

    /// Used only to restore a maker evicted during a rolled-back FOK pass:
    /// reinserts at the *head* of the level, recreating it if necessary,
    /// and never reorders the rest of the level.
    pub fn reinsert_at_head(&mut self, order: Order) {
        let price = order.price;
        let side = order.side;
        self.index.insert(order.id.clone(), (side, price));
        self.side_mut(side).push_front(price, order);
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.index.contains_key(order_id)
    }

    /// Looks up and removes an order by id, scanning its (known) price
    /// level in O(k). Drops the level if it becomes empty. Returns the
    /// removed order.
    pub fn cancel(&mut self, order_id: &str) -> bool {
        let Some((side, price)) = self.index.remove(order_id) else {
            return false;
        };
        let book_side = self.side_mut(side);
        if let Some(level) = book_side.levels.get_mut(&price) {
            if let Some(pos) = level.iter().position(|o| o.id == order_id) {
                level.remove(pos);
            } else {
                invariant_violation(&format!(
                    "order `{order_id}` was indexed but missing from its price level"
                ));
            }
        } else {
            invariant_violation(&format!(
                "order `{order_id}` was indexed at a price level that does not exist"
            ));
        }
        book_side.remove_level_if_empty(price);
        true
    }

    /// Removes the order's index entry without touching the level — used by
    /// the matcher once a maker is fully consumed and already popped off the
    /// front of its queue.
    pub fn forget(&mut self, order_id: &str) {
        self.index.remove(order_id);
    }

    pub fn recompute_bbo(&mut self) {
        let (best_bid_price, best_bid_quantity) = self.bids.top(Side::Buy);
        let (best_offer_price, best_offer_quantity) = self.asks.top(Side::Sell);
        self.bbo = Bbo {
            best_bid_price,
            best_bid_quantity,
            best_offer_price,
            best_offer_quantity,
        };
        if self.bbo.is_crossed() {
            invariant_violation("book is crossed after recomputing BBO");
        }
    }

    pub fn depth_snapshot(&self) -> DepthSnapshot {
        DepthSnapshot {
            bbo: self.bbo,
            bids: self.bids.depth(Side::Buy),
            asks: self.asks.depth(Side::Sell),
        }
    }
}

/// Internal invariant violations are fatal: they indicate a correctness bug
/// in the engine, not a runtime condition a caller can react to.
pub(crate) fn invariant_violation(message: &str) -> ! {
    warn!(message, "order book invariant violated, aborting");
    panic!("order book invariant violated: {message}");
}
