//! Quorum Core Domain
//!
//! Pure domain types for the Quorum decision engine.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Pipeline outputs
    Action,
    AggregatedSignal,
    // Book
    DailyPnL,
    Degradation,
    // Execution
    FillResult,
    // Inputs
    MarketSnapshot,
    OrderAck,
    OrderRequest,
    PortfolioState,
    Position,
    Signal,
    SignalSource,
    SourceContribution,
    SourceStatus,
    TradeDecision,
    returns_volatility,
};
pub use values::{Price, Quantity, Symbol, Timestamp};
