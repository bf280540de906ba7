//! Append-only trade records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::Side;

/// A single execution between a resting maker and an incoming taker.
///
/// Trades are emitted in execution order; `price` always equals the
/// maker's resting price at the moment of the match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub maker_order_id: String,
    pub taker_order_id: String,
    pub aggressor_side: Side,
}
