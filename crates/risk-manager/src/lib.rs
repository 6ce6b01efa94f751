//! Quorum Risk Manager
//!
//! Sits between the aggregator and the order submitter. Every directional
//! decision passes through here, and every acknowledged fill comes back.
//!
//! - **Vetoes**: daily loss limit, open position count, optional profit cap
//! - **Sizing**: position fraction scaled by confidence and volatility
//! - **Exits**: stop-loss, take-profit and trailing stop on held positions
//! - **Ledger**: cash, positions and session PnL
//!
//! ## Flow
//!
//! ```text
//!  AggregatedSignal ──┐
//!                     ├──► evaluate ──► TradeDecision ──► OrderSubmitter
//!  PortfolioState ────┘         │                              │
//!        ▲                      └──► Veto (SKIPPED)            │
//!        │                                                     ▼
//!        └──────────── portfolio_state ◄──── record_fill ◄── FillResult
//! ```
//!
//! The ledger is behind a single async `RwLock`: risk checks read a copy,
//! fills take the write lock, so concurrent fills never interleave.

pub mod error;
pub mod manager;
pub mod parameters;

pub use error::{Error, Result, Veto};
pub use manager::{ExitReason, RiskManager};
pub use parameters::{ExitRules, RiskConfig, RiskLimits, SizingParameters};
