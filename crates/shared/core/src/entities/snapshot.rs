use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::values::{Price, Symbol, Timestamp};

/// Market state for one symbol at fetch time
///
/// Immutable once built; every provider of a cycle sees the same snapshot.
/// `closes` holds the recent closing prices (oldest first) the feed had on
/// hand, and `volatility` is the population standard deviation of their
/// simple returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: Symbol,
    /// Last traded price
    pub price: Price,
    /// Traded volume over the feed's current bar
    pub volume: Decimal,
    /// When the feed produced this snapshot
    pub timestamp: Timestamp,
    /// Data version; equal versions mean equal market data
    pub version: u64,
    /// Recent closing prices, oldest first
    pub closes: Vec<Price>,
    /// Std deviation of simple returns over `closes`
    pub volatility: Decimal,
}

impl MarketSnapshot {
    pub fn new(symbol: impl Into<Symbol>, price: Price, volume: Decimal, timestamp: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            volume,
            timestamp,
            version: timestamp.timestamp_millis().max(0) as u64,
            closes: Vec::new(),
            volatility: Decimal::ZERO,
        }
    }

    /// Builder: attach recent closes and derive volatility from them
    pub fn with_closes(mut self, closes: Vec<Price>) -> Self {
        self.volatility = returns_volatility(&closes);
        self.closes = closes;
        self
    }

    /// Builder: override the data version
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Builder: override volatility (feeds that compute it upstream)
    pub fn with_volatility(mut self, volatility: Decimal) -> Self {
        self.volatility = volatility.max(Decimal::ZERO);
        self
    }
}

/// Population standard deviation of simple returns
///
/// Returns zero when fewer than two usable prices are available, or when
/// the prices are too far apart to compute without overflow.
pub fn returns_volatility(closes: &[Price]) -> Decimal {
    try_returns_volatility(closes).unwrap_or(Decimal::ZERO)
}

fn try_returns_volatility(closes: &[Price]) -> Option<Decimal> {
    let returns = closes
        .windows(2)
        .filter(|w| !w[0].is_zero())
        .map(|w| w[1].checked_sub(w[0])?.checked_div(w[0]))
        .collect::<Option<Vec<Decimal>>>()?;

    if returns.is_empty() {
        return Some(Decimal::ZERO);
    }

    let n = Decimal::from(returns.len());
    let mean = returns
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(*r))?
        .checked_div(n)?;
    let variance = returns
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| {
            let dev = r.checked_sub(mean)?;
            acc.checked_add(dev.checked_mul(dev)?)
        })?
        .checked_div(n)?;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_prices_have_zero_volatility() {
        let snap = MarketSnapshot::new("AAPL", dec!(100), dec!(1000), Utc::now())
            .with_closes(vec![dec!(100); 30]);
        assert_eq!(snap.volatility, Decimal::ZERO);
    }

    #[test]
    fn test_alternating_returns_volatility() {
        // Returns alternate between +10% and about -9.1%
        let closes = vec![dec!(100), dec!(110), dec!(100), dec!(110), dec!(100)];
        let vol = returns_volatility(&closes);
        assert!(vol > dec!(0.09) && vol < dec!(0.1));
    }

    #[test]
    fn test_extreme_prices_do_not_overflow() {
        let closes = vec![dec!(0.0000000000000000000000000001), Decimal::MAX, dec!(1)];
        assert_eq!(returns_volatility(&closes), Decimal::ZERO);

        let snap = MarketSnapshot::new("AAPL", dec!(1), dec!(1000), Utc::now()).with_closes(closes);
        assert_eq!(snap.volatility, Decimal::ZERO);
    }

    #[test]
    fn test_single_price_has_no_volatility() {
        assert_eq!(returns_volatility(&[dec!(5)]), Decimal::ZERO);
        assert_eq!(returns_volatility(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_version_defaults_to_timestamp_millis() {
        let now = Utc::now();
        let snap = MarketSnapshot::new("BTC", dec!(1), dec!(1), now);
        assert_eq!(snap.version, now.timestamp_millis() as u64);
        assert_eq!(snap.clone().with_version(7).version, 7);
    }
}
