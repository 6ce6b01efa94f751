//! Quorum Order Manager
//!
//! Sits between the signal providers and the execution gateway:
//! - **Signal Aggregation**: combines one cycle's signals per symbol into an
//!   [`AggregatedSignal`](quorum_core::AggregatedSignal) with quorum,
//!   confidence-floor and neutral-band degradation
//! - **Order Submission**: forwards approved decisions with bounded,
//!   idempotent retry
//!
//! ## Architecture
//!
//! ```text
//! Providers ──► Signals ──► ┌──────────────────────────────────────┐
//!                           │            Order Manager             │
//!                           │  ┌────────────────────────────────┐  │
//!                           │  │   Signal Aggregator            │  │
//!                           │  │   - weighted score             │  │
//!                           │  │   - quorum / confidence floor  │  │
//!                           │  │   - neutral band               │  │
//!                           │  └──────────────┬─────────────────┘  │
//!                           │                 │ AggregatedSignal   │
//!                           └─────────────────┼────────────────────┘
//!                                             ▼
//!                                       Risk Manager
//!                                             │ TradeDecision
//!                           ┌─────────────────▼────────────────────┐
//!                           │   Order Submitter                    │
//!                           │   - idempotency key = decision id    │
//!                           │   - doubling backoff, max attempts   │
//!                           └─────────────────┬────────────────────┘
//!                                             ▼
//!                                     Execution Gateway
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quorum_order_manager::{AggregatorConfig, SignalAggregator};
//!
//! let aggregator = SignalAggregator::new(AggregatorConfig::default());
//! let aggregated = aggregator.aggregate(&symbol, &signals, clock.now());
//! ```

pub mod aggregator;
pub mod error;
pub mod submitter;

// Re-export main types
pub use aggregator::{AggregatorConfig, CycleWindow, SignalAggregator};
pub use error::{Error, Result};
pub use submitter::{OrderSubmitter, RetryPolicy};
