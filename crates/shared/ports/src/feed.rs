use async_trait::async_trait;
use quorum_core::{MarketSnapshot, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FeedResult;

/// Port for market data
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Latest snapshot for a symbol, including recent closes
    async fn fetch_snapshot(&self, symbol: &Symbol) -> FeedResult<MarketSnapshot>;
}

/// Risk bucket attached to a sentiment reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// One reading from a sentiment source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// 0 = fully bearish, 1 = fully bullish
    pub reading: Decimal,
    pub risk_level: RiskLevel,
}

/// Port for macro / news sentiment
#[async_trait]
pub trait SentimentFeed: Send + Sync {
    async fn fetch_sentiment(&self, symbol: &Symbol) -> FeedResult<SentimentReading>;
}

/// Options and volume pressure for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFlowReading {
    pub put_call_ratio: Decimal,
    pub buy_volume: Decimal,
    pub sell_volume: Decimal,
    /// Change in volume against the recent average; positive means rising
    pub volume_trend: Decimal,
    pub call_volume: Decimal,
    pub put_volume: Decimal,
}

/// Port for order-flow data
#[async_trait]
pub trait OrderFlowFeed: Send + Sync {
    async fn fetch_order_flow(&self, symbol: &Symbol) -> FeedResult<OrderFlowReading>;
}
