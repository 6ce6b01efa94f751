//! Engine errors
//!
//! `ConfigError` is fatal and only happens before the session starts.
//! `CycleError` is why one symbol's cycle ended FAILED; the engine keeps
//! running and the symbol is tried again next tick.

use quorum_ports::{ExecutionError, FeedError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("Market data: {0}")]
    Feed(#[from] FeedError),

    #[error("Execution: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Ledger: {0}")]
    Ledger(#[from] quorum_risk_manager::Error),

    #[error("Cycle task ended abnormally: {0}")]
    Internal(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine already running")]
    AlreadyRunning,

    #[error("Engine not running")]
    NotRunning,
}

pub type Result<T> = std::result::Result<T, EngineError>;
