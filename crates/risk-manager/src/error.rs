//! Risk Manager errors and vetoes

use quorum_core::Symbol;
use rust_decimal::Decimal;
use thiserror::Error;

/// A defined negative outcome of `evaluate`: the trade is blocked
///
/// Not an error condition; the cycle ends SKIPPED.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Veto {
    #[error("daily loss limit reached: pnl {total} <= -{limit}")]
    DailyLossLimit { total: Decimal, limit: Decimal },

    #[error("open positions at limit: {open} >= {max}")]
    MaxOpenPositions { open: usize, max: usize },

    #[error("daily profit cap reached: pnl {total} >= {cap}")]
    DailyProfitCap { total: Decimal, cap: Decimal },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid risk configuration: {0}")]
    InvalidConfig(String),

    #[error("No open position in {0}")]
    NoPosition(Symbol),
}

pub type Result<T> = std::result::Result<T, Error>;
