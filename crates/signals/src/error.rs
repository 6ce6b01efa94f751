//! Provider errors

use quorum_core::{SignalSource, Symbol};
use quorum_ports::FeedError;
use thiserror::Error;

/// Failure of one provider call
///
/// Non-fatal: the aggregator records the source as failed for the cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Insufficient data: need {required} closes, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Data unavailable: {0}")]
    Unavailable(String),

    #[error("Computation failed: {0}")]
    Computation(String),

    #[error("Signal for {got} returned when {expected} was requested")]
    SymbolMismatch { expected: Symbol, got: Symbol },
}

impl From<FeedError> for ProviderError {
    fn from(e: FeedError) -> Self {
        match e {
            FeedError::InvalidData(msg) => ProviderError::Computation(msg),
            other => ProviderError::Unavailable(other.to_string()),
        }
    }
}

/// Building a provider set with two providers for one source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Provider already registered for source {0}")]
pub struct DuplicateSource(pub SignalSource);

pub type Result<T> = std::result::Result<T, ProviderError>;
