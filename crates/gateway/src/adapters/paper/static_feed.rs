//! Fixed-value sentiment and order-flow feeds
//!
//! Readings are set per symbol (with an optional fallback for symbols not
//! listed) and can be changed at runtime. An outage or a delay can be set
//! to drive the failure and timeout paths of the providers built on top.

use async_trait::async_trait;
use dashmap::DashMap;
use quorum_core::Symbol;
use quorum_ports::{
    FeedError, FeedResult, OrderFlowFeed, OrderFlowReading, SentimentFeed, SentimentReading,
};
use std::sync::RwLock;
use std::time::Duration;

/// Per-symbol table of readings of type `R`
pub struct StaticFeed<R> {
    readings: DashMap<Symbol, R>,
    fallback: Option<R>,
    outage: RwLock<Option<FeedError>>,
    delay: Option<Duration>,
}

pub type StaticSentimentFeed = StaticFeed<SentimentReading>;
pub type StaticOrderFlowFeed = StaticFeed<OrderFlowReading>;

impl<R: Clone + Send + Sync> StaticFeed<R> {
    pub fn new() -> Self {
        Self {
            readings: DashMap::new(),
            fallback: None,
            outage: RwLock::new(None),
            delay: None,
        }
    }

    /// Builder: reading served for symbols without their own entry
    pub fn with_fallback(mut self, reading: R) -> Self {
        self.fallback = Some(reading);
        self
    }

    /// Builder: reading for one symbol
    pub fn with_reading(self, symbol: impl Into<Symbol>, reading: R) -> Self {
        self.readings.insert(symbol.into(), reading);
        self
    }

    /// Builder: respond only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set(&self, symbol: impl Into<Symbol>, reading: R) {
        self.readings.insert(symbol.into(), reading);
    }

    /// Fail every fetch with `error` until cleared with `None`
    pub fn set_outage(&self, error: Option<FeedError>) {
        if let Ok(mut outage) = self.outage.write() {
            *outage = error;
        }
    }

    async fn read(&self, symbol: &Symbol) -> FeedResult<R> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outage = self.outage.read().ok().and_then(|o| o.clone());
        if let Some(err) = outage {
            return Err(err);
        }
        self.readings
            .get(symbol)
            .map(|r| r.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| FeedError::Unavailable(format!("no reading for {}", symbol)))
    }
}

impl<R: Clone + Send + Sync> Default for StaticFeed<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentFeed for StaticFeed<SentimentReading> {
    async fn fetch_sentiment(&self, symbol: &Symbol) -> FeedResult<SentimentReading> {
        self.read(symbol).await
    }
}

#[async_trait]
impl OrderFlowFeed for StaticFeed<OrderFlowReading> {
    async fn fetch_order_flow(&self, symbol: &Symbol) -> FeedResult<OrderFlowReading> {
        self.read(symbol).await
    }
}
