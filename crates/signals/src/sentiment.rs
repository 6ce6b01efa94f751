//! Sentiment Provider
//!
//! Maps a 0..1 sentiment reading to a score in [-1, 1] and discounts the
//! confidence by the reading's risk level.

use async_trait::async_trait;
use quorum_core::{MarketSnapshot, Signal, SignalSource, Symbol};
use quorum_ports::{Clock, RiskLevel, SentimentFeed};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::provider::SignalProvider;

pub struct SentimentProvider {
    feed: Arc<dyn SentimentFeed>,
    clock: Arc<dyn Clock>,
}

impl SentimentProvider {
    pub fn new(feed: Arc<dyn SentimentFeed>, clock: Arc<dyn Clock>) -> Self {
        Self { feed, clock }
    }
}

/// Confidence multiplier for a risk level
pub fn risk_confidence(level: RiskLevel) -> Decimal {
    match level {
        RiskLevel::Low => Decimal::ONE,
        RiskLevel::Medium => dec!(0.7),
        RiskLevel::High => dec!(0.5),
    }
}

#[async_trait]
impl SignalProvider for SentimentProvider {
    fn source(&self) -> SignalSource {
        SignalSource::Sentiment
    }

    async fn produce(&self, symbol: &Symbol, _snapshot: &MarketSnapshot) -> Result<Signal> {
        let reading = self.feed.fetch_sentiment(symbol).await?;
        if reading.reading < Decimal::ZERO || reading.reading > Decimal::ONE {
            return Err(ProviderError::Computation(format!(
                "sentiment reading {} outside [0, 1]",
                reading.reading
            )));
        }

        let score = dec!(2) * reading.reading - Decimal::ONE;
        Ok(Signal::new(
            SignalSource::Sentiment,
            symbol.clone(),
            score,
            risk_confidence(reading.risk_level),
            self.clock.now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use quorum_clock::ManualClock;
    use quorum_ports::{FeedError, FeedResult, SentimentReading};

    struct Reading(FeedResult<SentimentReading>);

    #[async_trait]
    impl SentimentFeed for Reading {
        async fn fetch_sentiment(&self, _symbol: &Symbol) -> FeedResult<SentimentReading> {
            self.0.clone()
        }
    }

    async fn produce(feed: Reading) -> Result<Signal> {
        let provider = SentimentProvider::new(Arc::new(feed), ManualClock::new(Utc::now()));
        let snapshot = MarketSnapshot::new("SPY", dec!(500), dec!(1), Utc::now());
        provider.produce(&Symbol::from("SPY"), &snapshot).await
    }

    #[tokio::test]
    async fn test_reading_maps_to_score_and_risk_confidence() {
        let signal = produce(Reading(Ok(SentimentReading {
            reading: dec!(0.8),
            risk_level: RiskLevel::High,
        })))
        .await
        .unwrap();
        assert_eq!(signal.score, dec!(0.6));
        assert_eq!(signal.confidence, dec!(0.5));
    }

    #[tokio::test]
    async fn test_feed_outage_is_unavailable() {
        let err = produce(Reading(Err(FeedError::Timeout))).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_reading_rejected() {
        let err = produce(Reading(Ok(SentimentReading {
            reading: dec!(1.4),
            risk_level: RiskLevel::Low,
        })))
        .await
        .unwrap_err();
        assert!(matches!(err, ProviderError::Computation(_)));
    }
}
