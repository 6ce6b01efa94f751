//! Adapters for the external ports
//!
//! `paper` simulates a live session without network access; `scripted`
//! replays fixed frames for tests and demos.

pub mod paper;
pub mod scripted;

pub use paper::{
    Fault, PaperExecutionConfig, PaperExecutionGateway, RandomWalkConfig, RandomWalkFeed,
    StaticFeed, StaticOrderFlowFeed, StaticSentimentFeed,
};
pub use scripted::{Frame, ScriptedFeed};
