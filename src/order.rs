//! The order model: sides, types, time-in-force, and field-level validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Ioc,
    Fok,
}

impl OrderType {
    /// IOC and FOK never rest regardless of unfilled residual; neither does Market.
    pub fn rests_on_book(self) -> bool {
        matches!(self, OrderType::Limit)
    }

    pub fn requires_positive_price(self) -> bool {
        matches!(self, OrderType::Limit | OrderType::Ioc | OrderType::Fok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-till-cancel: never expires implicitly.
    Gtc,
    /// Good-for-day: expires at 23:59:59 UTC of the order's own arrival day.
    Day,
    /// Good-till-date: expires at the explicit `expiry` on the order.
    Gtd,
}

/// A single order, resting or in-flight.
///
/// `remaining` is always `<= original`. Market orders carry `price = 0` and
/// never rest; limit/IOC/FOK require `price > 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub original_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub price: Decimal,
    pub arrival_time: DateTime<Utc>,
    pub time_in_force: TimeInForce,
    pub expiry: Option<DateTime<Utc>>,
}

impl Order {
    pub fn filled_quantity(&self) -> Decimal {
        self.original_quantity - self.remaining_quantity
    }

    pub fn is_fully_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }
}

/// Inputs for a new order, before the engine assigns an id and arrival time.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
    pub expiry: Option<DateTime<Utc>>,
}

/// Field-level validation only; does not look at book state.
///
/// Fails when quantity <= 0, price <= 0 for limit/IOC/FOK, or the symbol is
/// empty or does not match the book this order is being submitted against.
pub fn validate(new_order: &NewOrder, book_symbol: &str) -> Result<(), EngineError> {
    if new_order.quantity <= Decimal::ZERO {
        return Err(EngineError::InvalidOrder("quantity must be > 0".into()));
    }
    if new_order.order_type.requires_positive_price() && new_order.price <= Decimal::ZERO {
        return Err(EngineError::InvalidOrder(
            "price must be > 0 for limit, ioc, and fok orders".into(),
        ));
    }
    if new_order.symbol.is_empty() {
        return Err(EngineError::InvalidOrder("symbol must not be empty".into()));
    }
    if new_order.symbol != book_symbol {
        return Err(EngineError::InvalidOrder(format!(
            "symbol `{}` does not match book symbol `{}`",
            new_order.symbol, book_symbol
        )));
    }
    Ok(())
}
