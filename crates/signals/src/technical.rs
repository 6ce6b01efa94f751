//! Technical Provider
//!
//! Runs a fixed panel of indicator votes over the snapshot's recent closes:
//! - SMA crossover (short vs long mean)
//! - RSI (oversold buys, overbought sells)
//! - Momentum (three strictly rising / falling closes)
//! - MACD line vs its signal line
//! - Bollinger bands (touching the lower band buys, the upper band sells)
//! - Stochastic %K
//!
//! Score is the buy/sell vote balance; confidence is the share of votes that
//! agree with the winning side.

use async_trait::async_trait;
use quorum_core::{MarketSnapshot, Price, Signal, SignalSource, Symbol};
use quorum_ports::Clock;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::provider::SignalProvider;

/// One indicator's opinion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Buy,
    Sell,
    Hold,
}

/// Indicator parameters
#[derive(Debug, Clone, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    /// Closes required before any vote is taken
    pub min_history: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi_period: usize,
    pub rsi_oversold: Decimal,
    pub rsi_overbought: Decimal,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_width: Decimal,
    pub stochastic_period: usize,
    pub stochastic_oversold: Decimal,
    pub stochastic_overbought: Decimal,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            min_history: 20,
            sma_short: 10,
            sma_long: 50,
            rsi_period: 14,
            rsi_oversold: dec!(30),
            rsi_overbought: dec!(70),
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_width: dec!(2),
            stochastic_period: 14,
            stochastic_oversold: dec!(20),
            stochastic_overbought: dec!(80),
        }
    }
}

/// Majority-vote technical analyzer
pub struct TechnicalProvider {
    config: TechnicalConfig,
    clock: Arc<dyn Clock>,
}

impl TechnicalProvider {
    pub fn new(config: TechnicalConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Every indicator's vote over `closes` (oldest first)
    pub fn votes(&self, closes: &[Price]) -> Vec<Vote> {
        let c = &self.config;
        vec![
            sma_vote(closes, c.sma_short, c.sma_long),
            rsi_vote(closes, c.rsi_period, c.rsi_oversold, c.rsi_overbought),
            momentum_vote(closes),
            macd_vote(closes, c.macd_fast, c.macd_slow, c.macd_signal),
            bollinger_vote(closes, c.bollinger_period, c.bollinger_width),
            stochastic_vote(
                closes,
                c.stochastic_period,
                c.stochastic_oversold,
                c.stochastic_overbought,
            ),
        ]
    }
}

#[async_trait]
impl SignalProvider for TechnicalProvider {
    fn source(&self) -> SignalSource {
        SignalSource::Technical
    }

    fn params_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.config.hash(&mut hasher);
        hasher.finish()
    }

    async fn produce(&self, symbol: &Symbol, snapshot: &MarketSnapshot) -> Result<Signal> {
        let closes = &snapshot.closes;
        if closes.len() < self.config.min_history {
            return Err(ProviderError::InsufficientData {
                required: self.config.min_history,
                available: closes.len(),
            });
        }

        let votes = self.votes(closes);
        let (score, confidence) = tally(&votes);
        log::debug!(
            "[TECHNICAL] {}: votes={:?} score={:.3} confidence={:.3}",
            symbol,
            votes,
            score,
            confidence
        );

        Ok(Signal::new(
            SignalSource::Technical,
            symbol.clone(),
            score,
            confidence,
            self.clock.now(),
        ))
    }
}

/// (score, confidence) for a set of votes
pub fn tally(votes: &[Vote]) -> (Decimal, Decimal) {
    if votes.is_empty() {
        return (Decimal::ZERO, Decimal::ZERO);
    }
    let count = |v: Vote| votes.iter().filter(|x| **x == v).count();
    let (buys, sells, holds) = (count(Vote::Buy), count(Vote::Sell), count(Vote::Hold));
    let total = Decimal::from(votes.len());

    let score = Decimal::from(buys as i64 - sells as i64) / total;
    let agreeing = if score > Decimal::ZERO {
        buys
    } else if score < Decimal::ZERO {
        sells
    } else {
        holds.max(buys)
    };
    (score, Decimal::from(agreeing) / total)
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}

fn tail(closes: &[Price], n: usize) -> &[Price] {
    &closes[closes.len().saturating_sub(n)..]
}

fn sma_vote(closes: &[Price], short: usize, long: usize) -> Vote {
    let short_sma = mean(tail(closes, short));
    let long_sma = mean(tail(closes, long));
    match short_sma.cmp(&long_sma) {
        std::cmp::Ordering::Greater => Vote::Buy,
        std::cmp::Ordering::Less => Vote::Sell,
        std::cmp::Ordering::Equal => Vote::Hold,
    }
}

/// Relative strength index over the last `period` changes
pub fn rsi(closes: &[Price], period: usize) -> Option<Decimal> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let window = tail(closes, period + 1);
    let (mut gain, mut loss) = (Decimal::ZERO, Decimal::ZERO);
    for w in window.windows(2) {
        let delta = w[1] - w[0];
        if delta > Decimal::ZERO {
            gain += delta;
        } else {
            loss -= delta;
        }
    }
    if loss.is_zero() {
        return Some(if gain.is_zero() { dec!(50) } else { dec!(100) });
    }
    let rs = gain / loss;
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}

fn rsi_vote(closes: &[Price], period: usize, oversold: Decimal, overbought: Decimal) -> Vote {
    match rsi(closes, period) {
        Some(value) if value < oversold => Vote::Buy,
        Some(value) if value > overbought => Vote::Sell,
        _ => Vote::Hold,
    }
}

fn momentum_vote(closes: &[Price]) -> Vote {
    let [a, b, c] = match tail(closes, 3) {
        [a, b, c] => [*a, *b, *c],
        _ => return Vote::Hold,
    };
    if c > b && b > a {
        Vote::Buy
    } else if c < b && b < a {
        Vote::Sell
    } else {
        Vote::Hold
    }
}

/// Exponential moving average series, seeded with the first value
fn ema_series(values: &[Decimal], period: usize) -> Vec<Decimal> {
    let alpha = dec!(2) / Decimal::from(period + 1);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<Decimal> = None;
    for v in values {
        let next = match prev {
            Some(p) => p + alpha * (*v - p),
            None => *v,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

fn macd_vote(closes: &[Price], fast: usize, slow: usize, signal: usize) -> Vote {
    if closes.len() < slow + signal {
        return Vote::Hold;
    }
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);
    let macd: Vec<Decimal> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| *f - *s)
        .collect();
    let signal_line = ema_series(&macd, signal);

    match (macd.last(), signal_line.last()) {
        (Some(m), Some(s)) if m > s => Vote::Buy,
        (Some(m), Some(s)) if m < s => Vote::Sell,
        _ => Vote::Hold,
    }
}

fn bollinger_vote(closes: &[Price], period: usize, width: Decimal) -> Vote {
    if closes.len() < period {
        return Vote::Hold;
    }
    let window = tail(closes, period);
    let sma = mean(window);
    let variance = window.iter().map(|p| (*p - sma) * (*p - sma)).sum::<Decimal>()
        / Decimal::from(window.len());
    let std_dev = variance.sqrt().unwrap_or(Decimal::ZERO);
    if std_dev.is_zero() {
        return Vote::Hold;
    }

    let last = window[window.len() - 1];
    if last <= sma - width * std_dev {
        Vote::Buy
    } else if last >= sma + width * std_dev {
        Vote::Sell
    } else {
        Vote::Hold
    }
}

fn stochastic_vote(closes: &[Price], period: usize, oversold: Decimal, overbought: Decimal) -> Vote {
    if period == 0 || closes.len() < period {
        return Vote::Hold;
    }
    let window = tail(closes, period);
    let high = window.iter().copied().fold(Decimal::MIN, Decimal::max);
    let low = window.iter().copied().fold(Decimal::MAX, Decimal::min);
    if high == low {
        return Vote::Hold;
    }
    let last = window[window.len() - 1];
    let k = dec!(100) * (last - low) / (high - low);
    if k < oversold {
        Vote::Buy
    } else if k > overbought {
        Vote::Sell
    } else {
        Vote::Hold
    }
}
