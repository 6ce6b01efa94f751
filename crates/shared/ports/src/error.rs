use thiserror::Error;

/// Transient failure fetching external data
///
/// Never fatal: a failed fetch aborts the current cycle (or drops one
/// source) and the next tick tries again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Feed timed out")]
    Timeout,

    #[error("Invalid data from feed: {0}")]
    InvalidData(String),
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// Gateway rejection or failure to reach it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The gateway refused the order; resubmitting won't help
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Gateway timed out")]
    Timeout,

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

impl ExecutionError {
    /// Whether resubmitting with the same idempotency key may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExecutionError::Rejected(_))
    }
}

pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
