//! Concrete scenarios S1-S6: seeded order-book situations with a fixed
//! expected outcome for the next submitted order.

use rust_decimal::Decimal;
use tempfile::tempdir;

use order_book_engine::engine::{Engine, EngineConfig, SubmitStatus};
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

fn order(side: Side, order_type: OrderType, quantity: i64, price: i64) -> NewOrder {
    NewOrder {
        symbol: "BTC-USD".into(),
        side,
        order_type,
        quantity: Decimal::new(quantity, 0),
        price: Decimal::new(price, 0),
        time_in_force: TimeInForce::Gtc,
        expiry: None,
    }
}

#[tokio::test]
async fn s1_limit_rests() {
    let engine = engine().await;
    let ack = engine
        .submit_order(order(Side::Buy, OrderType::Limit, 5, 1000))
        .await
        .unwrap();
    assert_eq!(ack.status, SubmitStatus::AddedToBook);
    assert_eq!(ack.filled_quantity, Decimal::ZERO);
    let depth = engine.depth().await;
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].price, Decimal::new(1000, 0));
}

#[tokio::test]
async fn s2_market_crosses() {
    let engine = engine().await;
    engine
        .submit_order(order(Side::Sell, OrderType::Limit, 3, 2000))
        .await
        .unwrap();
    let ack = engine
        .submit_order(order(Side::Buy, OrderType::Market, 2, 0))
        .await
        .unwrap();
    assert_eq!(ack.filled_quantity, Decimal::new(2, 0));
    let depth = engine.depth().await;
    assert_eq!(depth.asks[0].quantity, Decimal::new(1, 0));
    let trades = engine.trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, Decimal::new(2000, 0));
    assert_eq!(trades[0].quantity, Decimal::new(2, 0));
    assert_eq!(trades[0].aggressor_side, Side::Buy);
}

#[tokio::test]
async fn s3_ioc_discards_residual() {
    let engine = engine().await;
    let ack = engine
        .submit_order(order(Side::Buy, OrderType::Ioc, 5, 1000))
        .await
        .unwrap();
    assert_eq!(ack.filled_quantity, Decimal::ZERO);
    assert!(!engine.cancel_order(ack.order_id).await);
    assert!(engine.trades().await.is_empty());
}

#[tokio::test]
async fn s4_fok_rejects_partial() {
    let engine = engine().await;
    engine
        .submit_order(order(Side::Sell, OrderType::Limit, 2, 1000))
        .await
        .unwrap();
    let ack = engine
        .submit_order(order(Side::Buy, OrderType::Fok, 5, 1000))
        .await
        .unwrap();
    assert_eq!(ack.filled_quantity, Decimal::ZERO);
    let depth = engine.depth().await;
    assert_eq!(depth.asks[0].quantity, Decimal::new(2, 0));
    assert!(engine.trades().await.is_empty());
}

#[tokio::test]
async fn s5_fok_succeeds() {
    let engine = engine().await;
    engine
        .submit_order(order(Side::Sell, OrderType::Limit, 2, 1000))
        .await
        .unwrap();
    engine
        .submit_order(order(Side::Sell, OrderType::Limit, 4, 1001))
        .await
        .unwrap();
    let ack = engine
        .submit_order(order(Side::Buy, OrderType::Fok, 5, 1001))
        .await
        .unwrap();
    assert_eq!(ack.filled_quantity, Decimal::new(5, 0));
    let trades = engine.trades().await;
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].price, Decimal::new(1000, 0));
    assert_eq!(trades[0].quantity, Decimal::new(2, 0));
    assert_eq!(trades[1].price, Decimal::new(1001, 0));
    assert_eq!(trades[1].quantity, Decimal::new(3, 0));
    let depth = engine.depth().await;
    assert_eq!(depth.asks.len(), 1);
    assert_eq!(depth.asks[0].price, Decimal::new(1001, 0));
    assert_eq!(depth.asks[0].quantity, Decimal::new(1, 0));
}

#[tokio::test]
async fn s6_price_time_priority() {
    let engine = engine().await;
    let first = engine
        .submit_order(order(Side::Buy, OrderType::Limit, 1, 100))
        .await
        .unwrap();
    let second = engine
        .submit_order(order(Side::Buy, OrderType::Limit, 1, 100))
        .await
        .unwrap();
    engine
        .submit_order(order(Side::Sell, OrderType::Market, 1, 0))
        .await
        .unwrap();
    let trades = engine.trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].maker_order_id, first.order_id);
    assert!(engine.cancel_order(second.order_id).await);
}
