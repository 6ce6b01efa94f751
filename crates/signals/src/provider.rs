//! Provider trait and the fixed provider collection

use async_trait::async_trait;
use quorum_core::{MarketSnapshot, Signal, SignalSource, Symbol};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{DuplicateSource, ProviderError, Result};

/// A pluggable signal source
///
/// Given a symbol and the cycle's snapshot, produce one signal or fail.
/// Implementations must be cheap to share across tasks.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    /// Which source this provider fills
    fn source(&self) -> SignalSource;

    /// Fingerprint of the provider's parameters, part of the cache key
    fn params_hash(&self) -> u64 {
        0
    }

    /// Provider name for logging
    fn name(&self) -> &str {
        self.source().as_str()
    }

    async fn produce(&self, symbol: &Symbol, snapshot: &MarketSnapshot) -> Result<Signal>;
}

/// Call a provider and reject signals that don't answer the question asked
pub async fn produce_checked(
    provider: &dyn SignalProvider,
    symbol: &Symbol,
    snapshot: &MarketSnapshot,
) -> Result<Signal> {
    if &snapshot.symbol != symbol {
        return Err(ProviderError::SymbolMismatch {
            expected: symbol.clone(),
            got: snapshot.symbol.clone(),
        });
    }

    let signal = provider.produce(symbol, snapshot).await?;
    if &signal.symbol != symbol {
        return Err(ProviderError::SymbolMismatch {
            expected: symbol.clone(),
            got: signal.symbol,
        });
    }
    if signal.source != provider.source() {
        return Err(ProviderError::Computation(format!(
            "{} provider returned a {} signal",
            provider.source(),
            signal.source
        )));
    }
    Ok(signal)
}

/// The registered providers, at most one per source
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: BTreeMap<SignalSource, Arc<dyn SignalProvider>>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a provider; a second provider for the same source is an error
    pub fn with(
        mut self,
        provider: Arc<dyn SignalProvider>,
    ) -> std::result::Result<Self, DuplicateSource> {
        let source = provider.source();
        if self.providers.contains_key(&source) {
            return Err(DuplicateSource(source));
        }
        self.providers.insert(source, provider);
        Ok(self)
    }

    pub fn get(&self, source: SignalSource) -> Option<&Arc<dyn SignalProvider>> {
        self.providers.get(&source)
    }

    /// Providers in source order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SignalProvider>> {
        self.providers.values()
    }

    pub fn sources(&self) -> Vec<SignalSource> {
        self.providers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct Fixed {
        source: SignalSource,
        symbol: Option<Symbol>,
    }

    #[async_trait]
    impl SignalProvider for Fixed {
        fn source(&self) -> SignalSource {
            self.source
        }

        async fn produce(&self, symbol: &Symbol, _snapshot: &MarketSnapshot) -> Result<Signal> {
            let symbol = self.symbol.clone().unwrap_or_else(|| symbol.clone());
            Ok(Signal::new(self.source, symbol, dec!(0.5), dec!(0.5), Utc::now()))
        }
    }

    fn fixed(source: SignalSource) -> Arc<dyn SignalProvider> {
        Arc::new(Fixed { source, symbol: None })
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let set = ProviderSet::new()
            .with(fixed(SignalSource::Technical))
            .unwrap()
            .with(fixed(SignalSource::Sentiment))
            .unwrap();
        assert_eq!(set.len(), 2);

        let err = set.with(fixed(SignalSource::Technical)).err();
        assert_eq!(err, Some(DuplicateSource(SignalSource::Technical)));
    }

    #[tokio::test]
    async fn test_wrong_symbol_is_rejected() {
        let provider = Fixed {
            source: SignalSource::OrderFlow,
            symbol: Some(Symbol::from("MSFT")),
        };
        let symbol = Symbol::from("AAPL");
        let snapshot = MarketSnapshot::new("AAPL", dec!(100), dec!(1), Utc::now());

        let result = produce_checked(&provider, &symbol, &snapshot).await;
        assert!(matches!(result, Err(ProviderError::SymbolMismatch { .. })));
    }
}
