//! Random-walk market data
//!
//! Each symbol gets its own price series, seeded with a warm-up history so
//! indicator providers have enough closes on the first fetch. Every fetch
//! advances the series by one step.

use async_trait::async_trait;
use log::debug;
use quorum_core::{MarketSnapshot, Price, Symbol};
use quorum_ports::{Clock, FeedError, FeedResult, MarketDataFeed};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Configuration for [`RandomWalkFeed`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomWalkConfig {
    /// Starting price for symbols not listed in `initial_prices`
    pub default_price: Decimal,
    pub initial_prices: BTreeMap<Symbol, Decimal>,
    /// Max relative move per step (0.01 = ±1%)
    pub step_volatility: Decimal,
    /// Closes kept per symbol and attached to each snapshot
    pub history: usize,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            default_price: dec!(100),
            initial_prices: BTreeMap::new(),
            step_volatility: dec!(0.01),
            history: 60,
            seed: None,
        }
    }
}

impl RandomWalkConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_price(mut self, symbol: impl Into<Symbol>, price: Decimal) -> Self {
        self.initial_prices.insert(symbol.into(), price);
        self
    }
}

struct Series {
    closes: VecDeque<Price>,
    version: u64,
}

struct WalkState {
    rng: StdRng,
    series: HashMap<Symbol, Series>,
}

/// Paper market data feed driven by a bounded random walk
pub struct RandomWalkFeed {
    config: RandomWalkConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<WalkState>,
}

impl RandomWalkFeed {
    pub fn new(config: RandomWalkConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            clock,
            state: Mutex::new(WalkState {
                rng,
                series: HashMap::new(),
            }),
        }
    }

    fn step(config: &RandomWalkConfig, rng: &mut StdRng, price: Price) -> Price {
        let vol = config.step_volatility.to_f64().unwrap_or(0.01);
        let change: f64 = rng.gen_range(-1.0..1.0) * vol;
        let multiplier = Decimal::from_f64_retain(1.0 + change).unwrap_or(Decimal::ONE);
        (price * multiplier).round_dp(2).max(dec!(0.01))
    }

    /// Current price of a symbol, if it has been fetched at least once
    pub async fn last_price(&self, symbol: &Symbol) -> Option<Price> {
        let state = self.state.lock().await;
        state.series.get(symbol).and_then(|s| s.closes.back().copied())
    }
}

#[async_trait]
impl MarketDataFeed for RandomWalkFeed {
    async fn fetch_snapshot(&self, symbol: &Symbol) -> FeedResult<MarketSnapshot> {
        let config = &self.config;
        let history = config.history.max(2);

        let mut guard = self.state.lock().await;
        let WalkState { rng, series } = &mut *guard;

        let entry = series.entry(symbol.clone()).or_insert_with(|| {
            let start = config
                .initial_prices
                .get(symbol)
                .copied()
                .unwrap_or(config.default_price);
            let mut closes = VecDeque::with_capacity(history);
            let mut price = start;
            for _ in 0..history {
                closes.push_back(price);
                price = Self::step(config, rng, price);
            }
            debug!("[FEED] Seeded {} with {} closes from {}", symbol, history, start);
            Series { closes, version: 0 }
        });

        let last = entry
            .closes
            .back()
            .copied()
            .ok_or_else(|| FeedError::InvalidData(format!("no price history for {}", symbol)))?;
        let price = Self::step(config, rng, last);
        entry.closes.push_back(price);
        while entry.closes.len() > history {
            entry.closes.pop_front();
        }
        entry.version += 1;

        let volume = Decimal::from(rng.gen_range(500_000u32..2_000_000u32));
        Ok(
            MarketSnapshot::new(symbol.clone(), price, volume, self.clock.now())
                .with_closes(entry.closes.iter().copied().collect())
                .with_version(entry.version),
        )
    }
}
