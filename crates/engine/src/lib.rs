//! Quorum Decision Engine
//!
//! Ties the pipeline together and exposes the session control surface:
//!
//! ```text
//!                 ┌──────────── DecisionEngine::tick ────────────┐
//!                 │  worker pool (worker_pool_size permits)       │
//!                 │                                               │
//!  watchlist ───► │  symbol ─► FETCH ─► ANALYZE ─► AGGREGATE ─►   │
//!                 │            feed     providers   aggregator    │
//!                 │                     via cache                 │
//!                 │        ─► RISK_CHECK ─► EXECUTE ─► record_fill│
//!                 │           risk mgr      submitter             │
//!                 └───────────────────────────────────────────────┘
//! ```
//!
//! - `start()` resets the session and ticks on `tick_interval_ms`
//! - `stop()` lets in-flight cycles finish and starts no new ones
//! - `tick()` runs one cycle for every symbol and returns the reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = SessionConfig::from_file("quorum.json")?;
//! let deps = paper_deps(&config, SystemClock::shared())?;
//! let engine = DecisionEngine::new(config, deps)?;
//! let report = engine.tick().await;
//! ```

pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod paper;

pub use config::{PaperConfig, SessionConfig, TradingHours};
pub use cycle::{CycleOutcome, CycleReport, CycleState, TickReport};
pub use engine::{DecisionEngine, EngineDeps, SignalCache};
pub use error::{ConfigError, CycleError, EngineError, Result};
pub use paper::paper_deps;
