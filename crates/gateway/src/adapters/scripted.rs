//! Scripted market data feed
//!
//! Replays a queue of frames per symbol. Each fetch consumes one frame;
//! the last frame repeats once the queue is down to one. Every pushed frame
//! gets its own data version, so a repeated frame reports the same version.
//! Snapshots are stamped with the clock at fetch time, so a `ManualClock`
//! controls how old the data looks.

use async_trait::async_trait;
use log::debug;
use quorum_core::{MarketSnapshot, Price, Symbol};
use quorum_ports::{Clock, FeedError, FeedResult, MarketDataFeed};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// One scripted response
#[derive(Debug, Clone)]
pub enum Frame {
    /// Closing prices, oldest first; the last close is the snapshot price
    Closes(Vec<Price>),
    Fail(FeedError),
}

#[derive(Default)]
struct Script {
    frames: VecDeque<(u64, Frame)>,
    pushed: u64,
    fetches: u64,
}

pub struct ScriptedFeed {
    clock: Arc<dyn Clock>,
    scripts: Mutex<HashMap<Symbol, Script>>,
    delay: Option<Duration>,
}

impl ScriptedFeed {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            scripts: Mutex::new(HashMap::new()),
            delay: None,
        }
    }

    /// Builder: respond only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append frames to a symbol's script
    pub async fn push(&self, symbol: impl Into<Symbol>, frames: impl IntoIterator<Item = Frame>) {
        let mut scripts = self.scripts.lock().await;
        let script = scripts.entry(symbol.into()).or_default();
        for frame in frames {
            script.pushed += 1;
            let version = script.pushed;
            script.frames.push_back((version, frame));
        }
    }

    /// Number of fetches served for a symbol
    pub async fn fetches(&self, symbol: &Symbol) -> u64 {
        let scripts = self.scripts.lock().await;
        scripts.get(symbol).map(|s| s.fetches).unwrap_or(0)
    }
}

#[async_trait]
impl MarketDataFeed for ScriptedFeed {
    async fn fetch_snapshot(&self, symbol: &Symbol) -> FeedResult<MarketSnapshot> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let frame = {
            let mut scripts = self.scripts.lock().await;
            let script = scripts
                .get_mut(symbol)
                .ok_or_else(|| FeedError::Unavailable(format!("no script for {}", symbol)))?;
            let frame = if script.frames.len() > 1 {
                script.frames.pop_front()
            } else {
                script.frames.front().cloned()
            };
            script.fetches += 1;
            frame
        };

        match frame {
            Some((version, Frame::Closes(closes))) => {
                let price = closes
                    .last()
                    .copied()
                    .ok_or_else(|| FeedError::InvalidData(format!("empty closes for {}", symbol)))?;
                debug!("[FEED] {} scripted frame {} @ {}", symbol, version, price);
                Ok(
                    MarketSnapshot::new(symbol.clone(), price, Decimal::from(1_000_000), self.clock.now())
                        .with_closes(closes)
                        .with_version(version),
                )
            }
            Some((_, Frame::Fail(err))) => Err(err),
            None => Err(FeedError::Unavailable(format!("script for {} is empty", symbol))),
        }
    }
}
