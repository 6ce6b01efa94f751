//! Order-Flow Provider
//!
//! Counts four bullish conditions in the options and volume data:
//! put/call ratio below 1, more buy than sell volume, rising volume, and
//! more call than put volume. The bullish share becomes the score; how far
//! it sits from an even split becomes the confidence.

use async_trait::async_trait;
use quorum_core::{MarketSnapshot, Signal, SignalSource, Symbol};
use quorum_ports::{Clock, OrderFlowFeed, OrderFlowReading};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::error::Result;
use crate::provider::SignalProvider;

pub struct OrderFlowProvider {
    feed: Arc<dyn OrderFlowFeed>,
    clock: Arc<dyn Clock>,
}

impl OrderFlowProvider {
    pub fn new(feed: Arc<dyn OrderFlowFeed>, clock: Arc<dyn Clock>) -> Self {
        Self { feed, clock }
    }
}

/// Number of bullish conditions met (0..=4)
pub fn bullish_conditions(flow: &OrderFlowReading) -> u32 {
    let conditions = [
        flow.put_call_ratio < Decimal::ONE,
        flow.buy_volume > flow.sell_volume,
        flow.volume_trend > Decimal::ZERO,
        flow.call_volume > flow.put_volume,
    ];
    conditions.iter().filter(|met| **met).count() as u32
}

/// (score, confidence) for a reading
pub fn order_flow_score(flow: &OrderFlowReading) -> (Decimal, Decimal) {
    let sentiment = Decimal::from(bullish_conditions(flow)) / dec!(4);
    let score = dec!(2) * sentiment - Decimal::ONE;
    let confidence = (sentiment - dec!(0.5)).abs() * dec!(2);
    (score, confidence)
}

#[async_trait]
impl SignalProvider for OrderFlowProvider {
    fn source(&self) -> SignalSource {
        SignalSource::OrderFlow
    }

    async fn produce(&self, symbol: &Symbol, _snapshot: &MarketSnapshot) -> Result<Signal> {
        let flow = self.feed.fetch_order_flow(symbol).await?;
        let (score, confidence) = order_flow_score(&flow);
        log::debug!(
            "[ORDER_FLOW] {}: bullish={}/4 score={} confidence={}",
            symbol,
            bullish_conditions(&flow),
            score,
            confidence
        );
        Ok(Signal::new(
            SignalSource::OrderFlow,
            symbol.clone(),
            score,
            confidence,
            self.clock.now(),
        ))
    }
}
