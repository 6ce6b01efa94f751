use quorum_core::Symbol;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Cache key: `(symbol, source, params_hash)`
///
/// `source` names the producer of the value (a signal source, or any other
/// label for non-signal values). `params_hash` folds in whatever makes two
/// computations for the same symbol and source differ, typically the
/// provider's parameters and the snapshot version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub symbol: Symbol,
    pub source: String,
    pub params_hash: u64,
}

impl CacheKey {
    pub fn new(symbol: impl Into<Symbol>, source: impl Into<String>, params_hash: u64) -> Self {
        Self {
            symbol: symbol.into(),
            source: source.into(),
            params_hash,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{:016x}", self.symbol, self.source, self.params_hash)
    }
}

/// Stable-within-process hash of any hashable parameter set
pub fn hash_params<H: Hash + ?Sized>(params: &H) -> u64 {
    let mut hasher = DefaultHasher::new();
    params.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_change_the_key() {
        let a = CacheKey::new("AAPL", "technical", hash_params(&(14u32, 1u64)));
        let b = CacheKey::new("AAPL", "technical", hash_params(&(14u32, 2u64)));
        assert_ne!(a, b);
        assert_eq!(a, CacheKey::new("AAPL", "technical", hash_params(&(14u32, 1u64))));
        assert!(a.to_string().starts_with("AAPL/technical/"));
    }
}
