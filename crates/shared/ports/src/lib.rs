//! Quorum Ports
//!
//! Port definitions (traits) for the Quorum decision engine.
//! These define the boundaries between the pipeline and the outside world:
//! market data, sentiment and order-flow feeds, order execution, and time.

mod clock;
mod error;
mod execution;
mod feed;

pub use clock::Clock;
pub use error::{ExecutionError, ExecutionResult, FeedError, FeedResult};
pub use execution::ExecutionGateway;
pub use feed::{
    MarketDataFeed, OrderFlowFeed, OrderFlowReading, RiskLevel, SentimentFeed, SentimentReading,
};
