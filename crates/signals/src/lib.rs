//! Quorum Signals
//!
//! Pluggable signal sources. Each provider turns a symbol plus the cycle's
//! market snapshot into one [`Signal`](quorum_core::Signal) or a
//! [`ProviderError`]; a failure only removes that source from the cycle.
//!
//! ## Architecture
//!
//! ```text
//!                   MarketSnapshot
//!                         │
//!        ┌────────────────┼────────────────┐
//!        ▼                ▼                ▼
//!   Technical         Sentiment        Order-Flow
//!  (closes only)   (SentimentFeed)   (OrderFlowFeed)
//!        │                │                │
//!        └──────── Signal{score, confidence} ───► Aggregator
//! ```
//!
//! Providers are registered in a [`ProviderSet`], one per source.

pub mod error;
pub mod order_flow;
pub mod provider;
pub mod sentiment;
pub mod technical;

// Re-export main types
pub use error::{DuplicateSource, ProviderError, Result};
pub use order_flow::OrderFlowProvider;
pub use provider::{ProviderSet, SignalProvider, produce_checked};
pub use sentiment::SentimentProvider;
pub use technical::{TechnicalConfig, TechnicalProvider, Vote};
