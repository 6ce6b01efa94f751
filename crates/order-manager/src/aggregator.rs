//! Signal Aggregation
//!
//! Combines the signals of one cycle into a single [`AggregatedSignal`].
//!
//! ## Weighting
//!
//! Each source has a static weight. Over the sources present this cycle:
//!
//! ```text
//! weighted_score     = Σ(w·score·conf) / Σ(w·conf)
//! overall_confidence = Σ(w·conf) / Σ(w)
//! ```
//!
//! ## Degradation
//!
//! Missing information never becomes a direction:
//! - fewer present sources than the quorum → score forced to 0 (HOLD)
//! - overall confidence under the floor → score forced to 0 (HOLD)
//! - |score| inside the neutral band → HOLD, score kept for the record

use chrono::Duration;
use quorum_core::{
    Action, AggregatedSignal, Degradation, Signal, SignalSource, SourceContribution, SourceStatus,
    Symbol, Timestamp,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Configuration for signal aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Static weight per source; absent or zero means ignored
    pub source_weights: BTreeMap<SignalSource, Decimal>,
    /// Minimum number of present sources for a directional signal
    pub quorum: usize,
    /// Minimum overall confidence for a directional signal
    pub confidence_floor: Decimal,
    /// Scores with |score| ≤ band are treated as HOLD
    pub neutral_band: Decimal,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            source_weights: BTreeMap::from([
                (SignalSource::Technical, dec!(1.0)),
                (SignalSource::Sentiment, dec!(0.5)),
                (SignalSource::OrderFlow, dec!(0.5)),
            ]),
            quorum: 2,
            confidence_floor: dec!(0.3),
            neutral_band: dec!(0.1),
        }
    }
}

impl AggregatorConfig {
    pub fn weight(&self, source: SignalSource) -> Decimal {
        self.source_weights
            .get(&source)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Sources with a positive weight
    pub fn weighted_sources(&self) -> Vec<SignalSource> {
        self.source_weights
            .iter()
            .filter(|(_, w)| **w > Decimal::ZERO)
            .map(|(s, _)| *s)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((source, w)) = self.source_weights.iter().find(|(_, w)| **w < Decimal::ZERO) {
            return Err(Error::InvalidConfig(format!(
                "weight for {} must be >= 0, got {}",
                source, w
            )));
        }
        let weighted = self.weighted_sources().len();
        if weighted == 0 {
            return Err(Error::InvalidConfig(
                "at least one source needs a positive weight".into(),
            ));
        }
        if self.quorum == 0 || self.quorum > weighted {
            return Err(Error::InvalidConfig(format!(
                "quorum must be between 1 and {} weighted sources, got {}",
                weighted, self.quorum
            )));
        }
        if self.confidence_floor < Decimal::ZERO || self.confidence_floor >= Decimal::ONE {
            return Err(Error::InvalidConfig(format!(
                "confidence_floor must be in [0, 1), got {}",
                self.confidence_floor
            )));
        }
        if self.neutral_band < Decimal::ZERO || self.neutral_band >= Decimal::ONE {
            return Err(Error::InvalidConfig(format!(
                "neutral_band must be in [0, 1), got {}",
                self.neutral_band
            )));
        }
        Ok(())
    }
}

/// Which signals belong to the current cycle
///
/// A signal counts while `started_at - produced_at < ttl(source)`, the same
/// rule the cache uses to serve it, and never when stamped after the
/// aggregation time.
#[derive(Debug, Clone)]
pub struct CycleWindow {
    pub started_at: Timestamp,
    pub ttl_by_source: BTreeMap<SignalSource, Duration>,
}

impl CycleWindow {
    pub fn new(started_at: Timestamp, ttl_by_source: BTreeMap<SignalSource, Duration>) -> Self {
        Self {
            started_at,
            ttl_by_source,
        }
    }

    pub fn admits(&self, signal: &Signal, now: Timestamp) -> bool {
        let ttl = self
            .ttl_by_source
            .get(&signal.source)
            .copied()
            .unwrap_or_else(Duration::zero);
        signal.produced_at <= now && self.started_at - signal.produced_at < ttl
    }
}

/// Aggregates per-cycle signals into one view per symbol
#[derive(Debug, Clone)]
pub struct SignalAggregator {
    config: AggregatorConfig,
}

impl SignalAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate whatever signals are at hand; absent sources are `Missing`
    pub fn aggregate(&self, symbol: &Symbol, signals: &[Signal], computed_at: Timestamp) -> AggregatedSignal {
        self.aggregate_cycle(symbol, signals, &BTreeMap::new(), None, computed_at)
    }

    /// Aggregate one engine cycle
    ///
    /// `excluded` records why a source has no signal (failed, timed out);
    /// `window`, when given, rejects signals outside the cycle window.
    pub fn aggregate_cycle(
        &self,
        symbol: &Symbol,
        signals: &[Signal],
        excluded: &BTreeMap<SignalSource, SourceStatus>,
        window: Option<&CycleWindow>,
        computed_at: Timestamp,
    ) -> AggregatedSignal {
        let mut weighted_sum = Decimal::ZERO;
        let mut confidence_sum = Decimal::ZERO;
        let mut weight_sum = Decimal::ZERO;
        let mut present = 0usize;
        let mut contributions = Vec::with_capacity(SignalSource::ALL.len());

        for source in SignalSource::ALL {
            let weight = self.config.weight(source);
            let signal = signals
                .iter()
                .filter(|s| s.source == source && &s.symbol == symbol)
                .max_by_key(|s| s.produced_at);

            let status = match signal {
                _ if weight <= Decimal::ZERO => SourceStatus::Unweighted,
                Some(s) if window.is_some_and(|w| !w.admits(s, computed_at)) => SourceStatus::Stale {
                    produced_at: s.produced_at,
                },
                Some(s) => {
                    weighted_sum += weight * s.score * s.confidence;
                    confidence_sum += weight * s.confidence;
                    weight_sum += weight;
                    present += 1;
                    SourceStatus::Contributed {
                        score: s.score,
                        confidence: s.confidence,
                    }
                }
                None => excluded.get(&source).cloned().unwrap_or(SourceStatus::Missing),
            };
            contributions.push(SourceContribution {
                source,
                weight,
                status,
            });
        }

        let raw_score = if confidence_sum.is_zero() {
            Decimal::ZERO
        } else {
            weighted_sum / confidence_sum
        };
        let overall_confidence = if weight_sum.is_zero() {
            Decimal::ZERO
        } else {
            confidence_sum / weight_sum
        };

        let degraded = if present < self.config.quorum {
            Some(Degradation::BelowQuorum {
                present,
                required: self.config.quorum,
            })
        } else if overall_confidence < self.config.confidence_floor {
            Some(Degradation::LowConfidence {
                confidence: overall_confidence,
                floor: self.config.confidence_floor,
            })
        } else {
            None
        };

        let weighted_score = if degraded.is_some() { Decimal::ZERO } else { raw_score };
        let direction = if degraded.is_some() || weighted_score.abs() <= self.config.neutral_band {
            Action::Hold
        } else if weighted_score > Decimal::ZERO {
            Action::Buy
        } else {
            Action::Sell
        };

        if let Some(reason) = &degraded {
            log::debug!("[AGGREGATOR] {} degraded to HOLD: {:?}", symbol, reason);
        }

        AggregatedSignal {
            symbol: symbol.clone(),
            weighted_score,
            overall_confidence,
            contributing_sources: contributions,
            direction,
            degraded,
            computed_at,
        }
    }
}
