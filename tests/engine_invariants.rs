//! The eight book invariants from the design notes, each exercised
//! directly against the engine.

use rust_decimal::Decimal;
use tempfile::tempdir;

use order_book_engine::engine::{Engine, EngineConfig};
use order_book_engine::order::{NewOrder, OrderType, Side, TimeInForce};

async fn engine() -> Engine {
    let dir = tempdir().unwrap();
    Engine::start(EngineConfig {
        symbol: "BTC-USD".into(),
        snapshot_dir: dir.into_path(),
        channel_capacity: 32,
    })
    .await
}

fn limit(side: Side, quantity: i64, price: i64) -> NewOrder {
    NewOrder {
        symbol: "BTC-USD".into(),
        side,
        order_type: OrderType::Limit,
        quantity: Decimal::new(quantity, 0),
        price: Decimal::new(price, 0),
        time_in_force: TimeInForce::Gtc,
        expiry: None,
    }
}

/// 1. Sum of trade fills for an order equals (original - remaining).
#[tokio::test]
async fn filled_quantity_matches_trade_sum() {
    let engine = engine().await;
    engine.submit_order(limit(Side::Sell, 10, 100)).await.unwrap();
    let ack = engine
        .submit_order(limit(Side::Buy, 6, 100))
        .await
        .unwrap();
    let trades = engine.trades().await;
    let sum: Decimal = trades
        .iter()
        .filter(|t| t.taker_order_id == ack.order_id)
        .map(|t| t.quantity)
        .sum();
    assert_eq!(sum, ack.filled_quantity);
}

/// 2/3. A cancelled order disappears from the index (cancel returns false
/// a second time) and its now-empty level is gone from depth.
#[tokio::test]
async fn cancel_drops_index_entry_and_empty_level() {
    let engine = engine().await;
    let ack = engine.submit_order(limit(Side::Buy, 5, 100)).await.unwrap();
    assert!(engine.cancel_order(ack.order_id.clone()).await);
    assert!(!engine.cancel_order(ack.order_id).await);
    let depth = engine.depth().await;
    assert!(depth.bids.is_empty());
}

/// 3. No empty level persists after a full fill either.
#[tokio::test]
async fn full_fill_removes_level() {
    let engine = engine().await;
    engine.submit_order(limit(Side::Sell, 5, 100)).await.unwrap();
    engine.submit_order(limit(Side::Buy, 5, 100)).await.unwrap();
    let depth = engine.depth().await;
    assert!(depth.asks.is_empty());
}

/// 4. Trade price equals the maker's resting price.
#[tokio::test]
async fn trade_price_equals_maker_price() {
    let engine = engine().await;
    engine.submit_order(limit(Side::Sell, 5, 2000)).await.unwrap();
    engine
        .submit_order(NewOrder {
            symbol: "BTC-USD".into(),
            side: Side::Buy,
            order_type: OrderType::Limit,
            quantity: Decimal::new(5, 0),
            price: Decimal::new(2500, 0),
            time_in_force: TimeInForce::Gtc,
            expiry: None,
        })
        .await
        .unwrap();
    let trades = engine.trades().await;
    assert_eq!(trades[0].price, Decimal::new(2000, 0));
}

/// 5. FOK either fully fills or leaves the book untouched with zero trades.
#[tokio::test]
async fn fok_all_or_nothing() {
    let engine = engine().await;
    engine.submit_order(limit(Side::Sell, 3, 1000)).await.unwrap();
    let before = engine.depth().await;

    let ack = engine
        .submit_order(NewOrder {
            symbol: "BTC-USD".into(),
            side: Side::Buy,
            order_type: OrderType::Fok,
            quantity: Decimal::new(9, 0),
            price: Decimal::new(1000, 0),
            time_in_force: TimeInForce::Gtc,
            expiry: None,
        })
        .await
        .unwrap();

    assert_eq!(ack.filled_quantity, Decimal::ZERO);
    assert!(engine.trades().await.is_empty());
    let after = engine.depth().await;
    assert_eq!(before.asks, after.asks);
}

/// 6. IOC residual is discarded and never lands in the index.
#[tokio::test]
async fn ioc_never_rests() {
    let engine = engine().await;
    engine.submit_order(limit(Side::Sell, 2, 1000)).await.unwrap();
    let ack = engine
        .submit_order(NewOrder {
            symbol: "BTC-USD".into(),
            side: Side::Buy,
            order_type: OrderType::Ioc,
            quantity: Decimal::new(5, 0),
            price: Decimal::new(1000, 0),
            time_in_force: TimeInForce::Gtc,
            expiry: None,
        })
        .await
        .unwrap();
    assert_eq!(ack.filled_quantity, Decimal::new(2, 0));
    assert!(!engine.cancel_order(ack.order_id).await);
}

/// 7. Market orders never rest; an unfilled market order vanishes silently.
#[tokio::test]
async fn market_order_residual_silently_discarded() {
    let engine = engine().await;
    let ack = engine
        .submit_order(NewOrder {
            symbol: "BTC-USD".into(),
            side: Side::Buy,
            order_type: OrderType::Market,
            quantity: Decimal::new(5, 0),
            price: Decimal::ZERO,
            time_in_force: TimeInForce::Gtc,
            expiry: None,
        })
        .await
        .unwrap();
    assert_eq!(ack.filled_quantity, Decimal::ZERO);
    let depth = engine.depth().await;
    assert!(depth.bids.is_empty());
}

/// 8. BBO never crosses once both sides are populated.
#[tokio::test]
async fn bbo_never_crosses() {
    let engine = engine().await;
    engine.submit_order(limit(Side::Buy, 5, 100)).await.unwrap();
    engine.submit_order(limit(Side::Sell, 5, 105)).await.unwrap();
    let bbo = engine.top_of_book().await;
    assert!(bbo.best_bid_price < bbo.best_offer_price);
    assert!(!bbo.is_crossed());
}
