//! Signal - What providers output
//!
//! Providers don't decide trades. They output a directional score with a
//! confidence; the aggregator combines these per symbol.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::values::{Symbol, Timestamp};

/// The fixed set of signal sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// Indicator votes over recent prices
    Technical,
    /// Macro / news sentiment
    Sentiment,
    /// Options and volume pressure
    #[serde(alias = "orderflow")]
    OrderFlow,
}

impl SignalSource {
    pub const ALL: [SignalSource; 3] = [
        SignalSource::Technical,
        SignalSource::Sentiment,
        SignalSource::OrderFlow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::Technical => "technical",
            SignalSource::Sentiment => "sentiment",
            SignalSource::OrderFlow => "order_flow",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of exactly one provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Which provider produced this signal
    pub source: SignalSource,
    pub symbol: Symbol,
    /// Direction and strength, -1 (strong sell) to 1 (strong buy)
    pub score: Decimal,
    /// Conviction in the score (0.0 - 1.0)
    pub confidence: Decimal,
    pub produced_at: Timestamp,
}

impl Signal {
    /// Create a signal; score and confidence are clamped into range
    pub fn new(
        source: SignalSource,
        symbol: impl Into<Symbol>,
        score: Decimal,
        confidence: Decimal,
        produced_at: Timestamp,
    ) -> Self {
        Self {
            source,
            symbol: symbol.into(),
            score: score.clamp(-Decimal::ONE, Decimal::ONE),
            confidence: confidence.clamp(Decimal::ZERO, Decimal::ONE),
            produced_at,
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.score > Decimal::ZERO
    }

    pub fn is_bearish(&self) -> bool {
        self.score < Decimal::ZERO
    }
}
