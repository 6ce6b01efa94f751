//! Per-symbol cycle states and reports
//!
//! ```text
//! IDLE → FETCHING → ANALYZING → AGGREGATING → RISK_CHECK ─┬─► SKIPPED
//!    │                                                    └─► DECIDED → EXECUTING → DONE
//!    │                                                           │           │
//!    └──────────── FAILED ◄── (fetch error)      HOLD ──► DONE ◄─┘           └─► FAILED
//! ```

use chrono::Duration;
use quorum_core::{AggregatedSignal, Symbol, Timestamp, TradeDecision};
use quorum_risk_manager::Veto;
use serde::Serialize;
use std::fmt;

use crate::error::CycleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleState {
    Idle,
    Fetching,
    Analyzing,
    Aggregating,
    RiskCheck,
    Decided,
    Skipped,
    Executing,
    Done,
    Failed,
}

impl CycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleState::Done | CycleState::Skipped | CycleState::Failed)
    }
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::Idle => "IDLE",
            CycleState::Fetching => "FETCHING",
            CycleState::Analyzing => "ANALYZING",
            CycleState::Aggregating => "AGGREGATING",
            CycleState::RiskCheck => "RISK_CHECK",
            CycleState::Decided => "DECIDED",
            CycleState::Skipped => "SKIPPED",
            CycleState::Executing => "EXECUTING",
            CycleState::Done => "DONE",
            CycleState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A BUY or SELL was acknowledged by the gateway and booked
    Done { decision: TradeDecision, order_id: String },
    /// The decision was HOLD; nothing was sent
    Held { decision: TradeDecision },
    /// Risk vetoed the trade
    Skipped { veto: Veto },
    /// The cycle gave up in `stage`
    Failed { stage: CycleState, error: CycleError },
}

impl CycleOutcome {
    pub fn decision(&self) -> Option<&TradeDecision> {
        match self {
            CycleOutcome::Done { decision, .. } | CycleOutcome::Held { decision } => Some(decision),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }
}

/// Trace of one symbol's cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub symbol: Symbol,
    /// States visited, in order, starting at IDLE
    pub states: Vec<CycleState>,
    /// The aggregated view, when the cycle got that far
    pub aggregated: Option<AggregatedSignal>,
    pub outcome: CycleOutcome,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl CycleReport {
    pub fn final_state(&self) -> CycleState {
        self.states.last().copied().unwrap_or(CycleState::Idle)
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

/// Result of one `tick`: one report per watchlist symbol, in watchlist order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    pub cycles: Vec<CycleReport>,
    /// True when the tick fell outside trading hours and started nothing
    pub outside_hours: bool,
}

impl TickReport {
    pub fn cycle(&self, symbol: &Symbol) -> Option<&CycleReport> {
        self.cycles.iter().find(|c| &c.symbol == symbol)
    }

    pub fn count(&self, state: CycleState) -> usize {
        self.cycles.iter().filter(|c| c.final_state() == state).count()
    }
}

/// Accumulates visited states while a cycle runs
pub(crate) struct Trace {
    symbol: Symbol,
    states: Vec<CycleState>,
    started_at: Timestamp,
    aggregated: Option<AggregatedSignal>,
}

impl Trace {
    pub(crate) fn start(symbol: Symbol, at: Timestamp) -> Self {
        Self {
            symbol,
            states: vec![CycleState::Idle],
            started_at: at,
            aggregated: None,
        }
    }

    pub(crate) fn enter(&mut self, state: CycleState) {
        log::trace!("[ENGINE] {} -> {}", self.symbol, state);
        self.states.push(state);
    }

    pub(crate) fn current(&self) -> CycleState {
        self.states.last().copied().unwrap_or(CycleState::Idle)
    }

    pub(crate) fn record_aggregate(&mut self, aggregated: AggregatedSignal) {
        self.aggregated = Some(aggregated);
    }

    pub(crate) fn finish(mut self, outcome: CycleOutcome, at: Timestamp) -> CycleReport {
        let terminal = match &outcome {
            CycleOutcome::Done { .. } | CycleOutcome::Held { .. } => CycleState::Done,
            CycleOutcome::Skipped { .. } => CycleState::Skipped,
            CycleOutcome::Failed { .. } => CycleState::Failed,
        };
        if self.current() != terminal {
            self.states.push(terminal);
        }
        CycleReport {
            symbol: self.symbol,
            states: self.states,
            aggregated: self.aggregated,
            outcome,
            started_at: self.started_at,
            finished_at: at,
        }
    }
}
