//! Risk Parameters
//!
//! Limits, sizing curve and exit rules. Loaded once at session start and
//! read-only for the rest of the session.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Portfolio-wide hard limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Largest single position as a fraction of portfolio value
    pub max_position_fraction: Decimal,
    /// Session loss at which new BUY/SELL decisions are vetoed
    pub max_daily_loss: Decimal,
    pub max_open_positions: usize,
    /// Session profit at which new BUYs stop (optional)
    pub max_daily_profit: Option<Decimal>,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_fraction: dec!(0.10),
            max_daily_loss: dec!(500),
            max_open_positions: 5,
            max_daily_profit: None,
        }
    }
}

/// Volatility-aware sizing curve
///
/// `factor = max(min_volatility_factor, 1 - volatility_penalty * σ)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingParameters {
    pub volatility_penalty: Decimal,
    pub min_volatility_factor: Decimal,
}

impl Default for SizingParameters {
    fn default() -> Self {
        Self {
            volatility_penalty: dec!(2),
            min_volatility_factor: dec!(0.2),
        }
    }
}

impl SizingParameters {
    /// Multiplier in [min_volatility_factor, 1]; falls as volatility rises
    pub fn volatility_factor(&self, volatility: Decimal) -> Decimal {
        let raw = Decimal::ONE - self.volatility_penalty * volatility.max(Decimal::ZERO);
        raw.clamp(self.min_volatility_factor, Decimal::ONE)
    }
}

/// Exit rules for open positions, as fractions of the entry / peak price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitRules {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub trailing_stop_pct: Decimal,
    pub use_trailing_stop: bool,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            stop_loss_pct: dec!(0.02),
            take_profit_pct: dec!(0.05),
            trailing_stop_pct: dec!(0.02),
            use_trailing_stop: true,
        }
    }
}

/// Everything the Risk Manager is configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub limits: RiskLimits,
    pub sizing: SizingParameters,
    pub exits: ExitRules,
    /// Cash at the first session start
    pub starting_capital: Decimal,
    /// Aggregated confidence below this never trades
    pub confidence_floor: Decimal,
    /// |score| at or below this never trades
    pub neutral_band: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            limits: RiskLimits::default(),
            sizing: SizingParameters::default(),
            exits: ExitRules::default(),
            starting_capital: dec!(10_000),
            confidence_floor: dec!(0.3),
            neutral_band: dec!(0.1),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        let l = &self.limits;
        if l.max_position_fraction <= Decimal::ZERO || l.max_position_fraction > Decimal::ONE {
            return Err(Error::InvalidConfig(format!(
                "max_position_fraction must be in (0, 1], got {}",
                l.max_position_fraction
            )));
        }
        if l.max_daily_loss <= Decimal::ZERO {
            return Err(Error::InvalidConfig(format!(
                "max_daily_loss must be > 0, got {}",
                l.max_daily_loss
            )));
        }
        if l.max_open_positions == 0 {
            return Err(Error::InvalidConfig("max_open_positions must be >= 1".into()));
        }
        if let Some(cap) = l.max_daily_profit {
            if cap <= Decimal::ZERO {
                return Err(Error::InvalidConfig(format!(
                    "max_daily_profit must be > 0, got {}",
                    cap
                )));
            }
        }
        if self.starting_capital <= Decimal::ZERO {
            return Err(Error::InvalidConfig(format!(
                "starting_capital must be > 0, got {}",
                self.starting_capital
            )));
        }
        if self.sizing.volatility_penalty < Decimal::ZERO
            || self.sizing.min_volatility_factor <= Decimal::ZERO
            || self.sizing.min_volatility_factor > Decimal::ONE
        {
            return Err(Error::InvalidConfig(
                "volatility_penalty must be >= 0 and min_volatility_factor in (0, 1]".into(),
            ));
        }
        for (name, pct) in [
            ("stop_loss_pct", self.exits.stop_loss_pct),
            ("take_profit_pct", self.exits.take_profit_pct),
            ("trailing_stop_pct", self.exits.trailing_stop_pct),
        ] {
            if pct <= Decimal::ZERO || pct >= Decimal::ONE {
                return Err(Error::InvalidConfig(format!(
                    "{} must be in (0, 1), got {}",
                    name, pct
                )));
            }
        }
        Ok(())
    }
}
