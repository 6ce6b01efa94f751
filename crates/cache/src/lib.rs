//! Quorum Cache
//!
//! Key/value store with per-entry expiry, shared by every signal provider so
//! identical lookups within a TTL window reuse the previous result and
//! concurrent lookups never trigger duplicate provider calls.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quorum_cache::{Cache, CacheKey};
//!
//! let cache: Cache<Signal, ProviderError> = Cache::new(clock);
//! let key = CacheKey::new("AAPL", "technical", params_hash);
//! let signal = cache
//!     .get_or_compute(key, Duration::seconds(60), || provider.produce(symbol, snapshot))
//!     .await?;
//! ```

mod cache;
mod error;
mod key;

pub use cache::{Cache, CacheEntry};
pub use error::CacheError;
pub use key::{CacheKey, hash_params};
