//! Paper trading adapters

mod execution;
mod market;
mod static_feed;

pub use execution::{Fault, PaperExecutionConfig, PaperExecutionGateway};
pub use market::{RandomWalkConfig, RandomWalkFeed};
pub use static_feed::{StaticFeed, StaticOrderFlowFeed, StaticSentimentFeed};
