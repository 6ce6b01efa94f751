//! Aggregation and submission against the paper gateway

use chrono::Utc;
use quorum_core::{Action, Signal, SignalSource, Symbol, TradeDecision};
use quorum_gateway::{Fault, PaperExecutionConfig, PaperExecutionGateway};
use quorum_order_manager::{AggregatorConfig, OrderSubmitter, RetryPolicy, SignalAggregator};
use quorum_clock::SystemClock;
use quorum_ports::ExecutionError;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn paper() -> Arc<PaperExecutionGateway> {
    Arc::new(PaperExecutionGateway::new(
        PaperExecutionConfig::default(),
        SystemClock::shared(),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_lost_ack_is_recovered_without_double_fill() {
    init_logging();
    let gateway = paper();
    gateway.inject(Fault::LoseAck).await;
    gateway.inject(Fault::LoseAck).await;

    let submitter = OrderSubmitter::new(gateway.clone(), RetryPolicy::default());
    let decision = TradeDecision::new("AAPL", Action::Buy, dec!(640), dec!(6.4), dec!(100), Utc::now());

    let ack = submitter.submit(&decision).await.unwrap();
    assert!(ack.accepted);
    assert_eq!(ack.fill.map(|f| f.quantity), Some(dec!(6.4)));
    assert_eq!(gateway.submissions(), 3);
    assert_eq!(gateway.orders_placed(), 1);
    assert_eq!(gateway.ack_for(&decision.decision_id).map(|a| a.order_id), Some(ack.order_id));
}

#[tokio::test(start_paused = true)]
async fn test_outage_exhausts_retries() {
    init_logging();
    let gateway = paper();
    for _ in 0..3 {
        gateway
            .inject(Fault::Fail(ExecutionError::Unavailable("exchange down".into())))
            .await;
    }

    let submitter = OrderSubmitter::new(gateway.clone(), RetryPolicy::default());
    let decision = TradeDecision::new("MSFT", Action::Sell, dec!(400), dec!(1), dec!(400), Utc::now());

    let err = submitter.submit(&decision).await.unwrap_err();
    assert_eq!(err, ExecutionError::Unavailable("exchange down".into()));
    assert_eq!(gateway.orders_placed(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_aggregated_buy_flows_to_a_single_fill() {
    init_logging();
    let now = Utc::now();
    let symbol = Symbol::from("AAPL");
    let aggregator = SignalAggregator::new(AggregatorConfig::default());
    let signals = [
        Signal::new(SignalSource::Technical, symbol.clone(), dec!(0.8), dec!(0.9), now),
        Signal::new(SignalSource::Sentiment, symbol.clone(), dec!(0.6), dec!(0.7), now),
        Signal::new(SignalSource::OrderFlow, symbol.clone(), dec!(0.7), dec!(1.0), now),
    ];

    let aggregated = aggregator.aggregate(&symbol, &signals, now);
    assert_eq!(aggregated.direction, Action::Buy);

    let decision = TradeDecision::new(symbol, aggregated.direction, dec!(500), dec!(5), dec!(100), now);
    let gateway = paper();
    let submitter = OrderSubmitter::new(gateway.clone(), RetryPolicy::default());

    let first = submitter.submit(&decision).await.unwrap();
    let again = submitter.submit(&decision).await.unwrap();
    assert_eq!(first, again);
    assert_eq!(gateway.orders_placed(), 1);
}
