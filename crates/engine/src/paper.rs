//! Paper session wiring
//!
//! Builds every external collaborator from the `paper` section of the
//! session config: a random-walk feed, static sentiment and order-flow
//! feeds, the three providers and the paper execution gateway.

use quorum_gateway::{
    PaperExecutionGateway, RandomWalkFeed, StaticOrderFlowFeed, StaticSentimentFeed,
};
use quorum_ports::Clock;
use quorum_signals::{OrderFlowProvider, ProviderSet, SentimentProvider, TechnicalProvider};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::engine::EngineDeps;
use crate::error::ConfigError;

pub fn paper_deps(config: &SessionConfig, clock: Arc<dyn Clock>) -> Result<EngineDeps, ConfigError> {
    let paper = &config.paper;

    let mut sentiment = StaticSentimentFeed::new();
    if let Some(reading) = &paper.sentiment {
        sentiment = sentiment.with_fallback(reading.clone());
    }
    for (symbol, reading) in &paper.sentiment_by_symbol {
        sentiment.set(symbol.clone(), reading.clone());
    }

    let mut order_flow = StaticOrderFlowFeed::new();
    if let Some(reading) = &paper.order_flow {
        order_flow = order_flow.with_fallback(reading.clone());
    }
    for (symbol, reading) in &paper.order_flow_by_symbol {
        order_flow.set(symbol.clone(), reading.clone());
    }

    let providers = ProviderSet::new()
        .with(Arc::new(TechnicalProvider::new(config.technical.clone(), clock.clone())))
        .and_then(|set| set.with(Arc::new(SentimentProvider::new(Arc::new(sentiment), clock.clone()))))
        .and_then(|set| {
            set.with(Arc::new(OrderFlowProvider::new(Arc::new(order_flow), clock.clone())))
        })
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    Ok(EngineDeps {
        feed: Arc::new(RandomWalkFeed::new(paper.market.clone(), clock.clone())),
        gateway: Arc::new(PaperExecutionGateway::new(paper.execution.clone(), clock.clone())),
        providers,
        clock,
    })
}
