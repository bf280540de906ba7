//! Derived best-bid/best-offer and per-price depth.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-of-book snapshot. When a side is empty, all four of its fields are
/// zero rather than `None` — this mirrors the wire-level shape callers get.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbo {
    pub best_bid_price: Decimal,
    pub best_bid_quantity: Decimal,
    pub best_offer_price: Decimal,
    pub best_offer_quantity: Decimal,
}

impl Bbo {
    pub fn empty() -> Self {
        Self {
            best_bid_price: Decimal::ZERO,
            best_bid_quantity: Decimal::ZERO,
            best_offer_price: Decimal::ZERO,
            best_offer_quantity: Decimal::ZERO,
        }
    }

    /// No crossed book: whenever both sides are non-empty, the best bid must
    /// be strictly below the best offer.
    pub fn is_crossed(&self) -> bool {
        self.best_bid_price > Decimal::ZERO
            && self.best_offer_price > Decimal::ZERO
            && self.best_bid_price >= self.best_offer_price
    }
}

/// One price level's aggregate remaining quantity, for depth queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Decimal,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub bbo: Bbo,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}
