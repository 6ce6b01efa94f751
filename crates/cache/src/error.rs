//! Cache errors

use thiserror::Error;

/// Outcome of a `get_or_compute` that produced no value
///
/// `E` is the compute function's own error; every waiter on the same key
/// receives a clone of it, and nothing is cached.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError<E> {
    #[error("Computation failed: {0}")]
    Compute(E),

    /// The computation task stopped (panicked) before producing a result
    #[error("Computation ended without a result")]
    Interrupted,
}

impl<E> CacheError<E> {
    /// The compute function's error, if that is what happened
    pub fn into_compute(self) -> Option<E> {
        match self {
            CacheError::Compute(e) => Some(e),
            CacheError::Interrupted => None,
        }
    }
}
