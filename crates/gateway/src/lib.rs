//! Quorum Gateway
//!
//! Simulated implementations of every external port, so the engine can run
//! a full session offline:
//! - `RandomWalkFeed` / `ScriptedFeed` for market data
//! - `StaticSentimentFeed` / `StaticOrderFlowFeed` for provider inputs
//! - `PaperExecutionGateway` for order execution
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────────────── quorum-ports ───────────────────────┐
//!            │ MarketDataFeed   SentimentFeed   OrderFlowFeed   Execution  │
//!            └──────▲────────────────▲───────────────▲─────────────▲──────┘
//!                   │                │               │             │
//!   RandomWalkFeed ─┤   StaticFeed<SentimentReading> │   PaperExecutionGateway
//!   ScriptedFeed ───┘                   StaticFeed<OrderFlowReading>
//! ```
//!
//! Live exchange or data-vendor adapters would sit next to these behind
//! the same traits.

pub mod adapters;

pub use adapters::{
    Fault, Frame, PaperExecutionConfig, PaperExecutionGateway, RandomWalkConfig, RandomWalkFeed,
    ScriptedFeed, StaticFeed, StaticOrderFlowFeed, StaticSentimentFeed,
};
