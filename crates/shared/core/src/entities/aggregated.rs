//! AggregatedSignal - one per symbol per cycle
//!
//! Combines whichever provider signals made it into the cycle. Sources that
//! did not contribute are still listed, with the reason they were left out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::decision::Action;
use super::signal::SignalSource;
use crate::values::{Symbol, Timestamp};

/// Why a source did or did not take part in an aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// Signal used in the weighted score
    Contributed { score: Decimal, confidence: Decimal },
    /// No signal was handed to the aggregator
    Missing,
    /// Provider call failed this cycle
    Failed { reason: String },
    /// Provider did not answer before the cycle timeout
    TimedOut,
    /// Signal was produced outside the cycle window
    Stale { produced_at: Timestamp },
    /// Source has no positive weight configured
    Unweighted,
}

impl SourceStatus {
    pub fn is_contributing(&self) -> bool {
        matches!(self, SourceStatus::Contributed { .. })
    }
}

/// One row of the aggregation ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceContribution {
    pub source: SignalSource,
    pub weight: Decimal,
    pub status: SourceStatus,
}

/// Why the score was forced to zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// Fewer sources present than the quorum
    BelowQuorum { present: usize, required: usize },
    /// Overall confidence under the configured floor
    LowConfidence { confidence: Decimal, floor: Decimal },
}

/// Combined view of all sources for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedSignal {
    pub symbol: Symbol,
    /// Confidence-weighted score in [-1, 1]; zero when degraded
    pub weighted_score: Decimal,
    /// Weighted mean confidence in [0, 1]
    pub overall_confidence: Decimal,
    /// Every known source, contributing or not
    pub contributing_sources: Vec<SourceContribution>,
    /// Direction after degradation and neutral band
    pub direction: Action,
    pub degraded: Option<Degradation>,
    pub computed_at: Timestamp,
}

impl AggregatedSignal {
    /// Number of sources that contributed a signal
    pub fn present_count(&self) -> usize {
        self.contributing_sources
            .iter()
            .filter(|c| c.status.is_contributing())
            .count()
    }

    pub fn status_of(&self, source: SignalSource) -> Option<&SourceStatus> {
        self.contributing_sources
            .iter()
            .find(|c| c.source == source)
            .map(|c| &c.status)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_present_count_ignores_excluded_sources() {
        let agg = AggregatedSignal {
            symbol: Symbol::from("AAPL"),
            weighted_score: dec!(0.5),
            overall_confidence: dec!(0.6),
            contributing_sources: vec![
                SourceContribution {
                    source: SignalSource::Technical,
                    weight: dec!(1),
                    status: SourceStatus::Contributed { score: dec!(0.5), confidence: dec!(0.6) },
                },
                SourceContribution {
                    source: SignalSource::Sentiment,
                    weight: dec!(0.5),
                    status: SourceStatus::TimedOut,
                },
            ],
            direction: Action::Buy,
            degraded: None,
            computed_at: Utc::now(),
        };

        assert_eq!(agg.present_count(), 1);
        assert_eq!(agg.status_of(SignalSource::Sentiment), Some(&SourceStatus::TimedOut));
        assert_eq!(agg.status_of(SignalSource::OrderFlow), None);
        assert!(!agg.is_degraded());
    }
}
