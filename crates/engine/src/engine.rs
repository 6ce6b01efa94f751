//! Decision Engine
//!
//! Drives one cycle per watchlist symbol per tick:
//!
//! 1. FETCHING: snapshot from the market feed; mark held positions
//! 2. ANALYZING: one task per provider through the shared cache, joined
//!    against the cycle deadline; late tasks are aborted
//! 3. AGGREGATING: combine whatever arrived, recording exclusions
//! 4. RISK_CHECK: exits first, then the signal-driven evaluation
//! 5. EXECUTING: idempotent submission with retry, then book the fill
//!
//! Symbols run concurrently on a bounded worker pool. A slow or failing
//! symbol holds one permit and never blocks the others past its deadline.

use log::{debug, error, info, warn};
use quorum_cache::{Cache, CacheError, CacheKey, hash_params};
use quorum_core::{
    Action, FillResult, MarketSnapshot, Signal, SignalSource, SourceStatus, Symbol, TradeDecision,
};
use quorum_order_manager::{CycleWindow, OrderSubmitter, SignalAggregator};
use quorum_ports::{Clock, ExecutionGateway, FeedError, MarketDataFeed};
use quorum_risk_manager::RiskManager;
use quorum_signals::{ProviderError, ProviderSet, produce_checked};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, timeout_at};

use crate::config::SessionConfig;
use crate::cycle::{CycleOutcome, CycleReport, CycleState, TickReport, Trace};
use crate::error::{ConfigError, CycleError, EngineError, Result};

/// Cache of provider signals shared across all cycles
pub type SignalCache = Cache<Signal, ProviderError>;

/// External collaborators the engine is wired to
pub struct EngineDeps {
    pub clock: Arc<dyn Clock>,
    pub feed: Arc<dyn MarketDataFeed>,
    pub providers: ProviderSet,
    pub gateway: Arc<dyn ExecutionGateway>,
}

struct Core {
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    feed: Arc<dyn MarketDataFeed>,
    providers: ProviderSet,
    cache: SignalCache,
    aggregator: SignalAggregator,
    risk: Arc<RiskManager>,
    submitter: OrderSubmitter,
    workers: Arc<Semaphore>,
}

struct Running {
    shutdown: watch::Sender<bool>,
    ticker: JoinHandle<()>,
    janitor: JoinHandle<()>,
}

/// Per-symbol decision pipeline with session control
pub struct DecisionEngine {
    core: Arc<Core>,
    running: Mutex<Option<Running>>,
}

impl DecisionEngine {
    /// Validate the config and assemble the pipeline
    pub fn new(config: SessionConfig, deps: EngineDeps) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        if deps.providers.is_empty() {
            return Err(ConfigError::Invalid("no signal providers registered".into()));
        }

        let risk = Arc::new(RiskManager::new(config.risk_config(), deps.clock.clone()));
        let core = Core {
            aggregator: SignalAggregator::new(config.aggregator_config()),
            submitter: OrderSubmitter::new(deps.gateway, config.execution.clone()),
            cache: Cache::new(deps.clock.clone()),
            workers: Arc::new(Semaphore::new(config.worker_pool_size)),
            clock: deps.clock,
            feed: deps.feed,
            providers: deps.providers,
            risk,
            config,
        };
        Ok(Self {
            core: Arc::new(core),
            running: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.core.config
    }

    pub fn risk(&self) -> &Arc<RiskManager> {
        &self.core.risk
    }

    pub fn cache(&self) -> &SignalCache {
        &self.core.cache
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Run one cycle for every watchlist symbol and wait for all of them
    pub async fn tick(&self) -> TickReport {
        Core::tick(&self.core).await
    }

    /// Begin ticking on the configured interval
    ///
    /// Resets the session PnL and starts the cache janitor.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        self.core.risk.reset_session().await;
        let janitor = self.core.cache.spawn_janitor(self.core.config.tick_interval());

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let core = self.core.clone();
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval(core.config.tick_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = interval.tick() => {
                        // A tick in progress finishes before shutdown is seen
                        let report = Core::tick(&core).await;
                        debug!(
                            "[ENGINE] Tick: {} done, {} skipped, {} failed",
                            report.count(CycleState::Done),
                            report.count(CycleState::Skipped),
                            report.count(CycleState::Failed)
                        );
                    }
                }
            }
        });

        info!(
            "[ENGINE] Started: {} symbols every {:?}, {} workers",
            self.core.config.watchlist.len(),
            self.core.config.tick_interval(),
            self.core.config.worker_pool_size
        );
        *running = Some(Running {
            shutdown,
            ticker,
            janitor,
        });
        Ok(())
    }

    /// Stop ticking; in-flight cycles finish, no new ones start
    pub async fn stop(&self) -> Result<()> {
        let Some(running) = self.running.lock().await.take() else {
            return Err(EngineError::NotRunning);
        };
        let _ = running.shutdown.send(true);
        if let Err(e) = running.ticker.await {
            error!("[ENGINE] Tick loop ended abnormally: {}", e);
        }
        running.janitor.abort();
        info!("[ENGINE] Stopped");
        Ok(())
    }
}

impl Core {
    async fn tick(core: &Arc<Core>) -> TickReport {
        let now = core.clock.now();
        if let Some(hours) = &core.config.trading_hours {
            if !hours.contains(now) {
                debug!("[ENGINE] {} outside trading hours, no cycles", now.format("%H:%M"));
                return TickReport {
                    cycles: Vec::new(),
                    outside_hours: true,
                };
            }
        }

        let watchlist = &core.config.watchlist;
        let mut cycles = JoinSet::new();
        for (index, symbol) in watchlist.iter().enumerate() {
            let core = core.clone();
            let symbol = symbol.clone();
            cycles.spawn(async move {
                let report = match core.workers.clone().acquire_owned().await {
                    Ok(_permit) => core.run_cycle(symbol).await,
                    Err(_) => {
                        let at = core.clock.now();
                        Trace::start(symbol, at).finish(
                            CycleOutcome::Failed {
                                stage: CycleState::Idle,
                                error: CycleError::Internal("worker pool closed".into()),
                            },
                            at,
                        )
                    }
                };
                (index, report)
            });
        }

        let mut reports: Vec<Option<CycleReport>> = vec![None; watchlist.len()];
        while let Some(joined) = cycles.join_next().await {
            match joined {
                Ok((index, report)) => reports[index] = Some(report),
                Err(e) => error!("[ENGINE] Cycle task ended abnormally: {}", e),
            }
        }

        let finished = core.clock.now();
        let cycles = reports
            .into_iter()
            .zip(watchlist)
            .map(|(report, symbol)| {
                report.unwrap_or_else(|| {
                    Trace::start(symbol.clone(), now).finish(
                        CycleOutcome::Failed {
                            stage: CycleState::Idle,
                            error: CycleError::Internal("cycle task panicked".into()),
                        },
                        finished,
                    )
                })
            })
            .collect();
        TickReport {
            cycles,
            outside_hours: false,
        }
    }

    async fn run_cycle(&self, symbol: Symbol) -> CycleReport {
        let mut trace = Trace::start(symbol.clone(), self.clock.now());
        let outcome = self.drive(&symbol, &mut trace).await;

        match &outcome {
            CycleOutcome::Done { decision, order_id } => info!(
                "[ENGINE] {} DONE: {} {} @ {} ({})",
                symbol, decision.action, decision.quantity, decision.price, order_id
            ),
            CycleOutcome::Held { decision } => {
                info!("[ENGINE] {} DONE: HOLD ({})", symbol, decision.rationale)
            }
            CycleOutcome::Skipped { veto } => info!("[ENGINE] {} SKIPPED: {}", symbol, veto),
            CycleOutcome::Failed { stage, error } => {
                warn!("[ENGINE] {} FAILED in {}: {}", symbol, stage, error)
            }
        }
        trace.finish(outcome, self.clock.now())
    }

    async fn drive(&self, symbol: &Symbol, trace: &mut Trace) -> CycleOutcome {
        let deadline = Instant::now() + self.config.cycle_timeout();

        trace.enter(CycleState::Fetching);
        let snapshot = match timeout_at(deadline, self.feed.fetch_snapshot(symbol)).await {
            Ok(Ok(snapshot)) => Arc::new(snapshot),
            Ok(Err(e)) => return failed(trace, CycleError::Feed(e)),
            Err(_) => return failed(trace, CycleError::Feed(FeedError::Timeout)),
        };
        self.risk.update_mark(symbol, snapshot.price).await;

        trace.enter(CycleState::Analyzing);
        let started_at = self.clock.now();
        let (signals, excluded) = self.analyze(symbol, &snapshot, deadline).await;

        trace.enter(CycleState::Aggregating);
        let window = CycleWindow::new(started_at, self.config.ttl_by_source());
        let aggregated = self.aggregator.aggregate_cycle(
            symbol,
            &signals,
            &excluded,
            Some(&window),
            self.clock.now(),
        );
        debug!(
            "[ENGINE] {} aggregated: score={} confidence={} sources={}/{} direction={}",
            symbol,
            aggregated.weighted_score.round_dp(3),
            aggregated.overall_confidence.round_dp(3),
            aggregated.present_count(),
            aggregated.contributing_sources.len(),
            aggregated.direction
        );

        trace.enter(CycleState::RiskCheck);
        let state = self.risk.portfolio_state().await;
        let verdict = match self.risk.evaluate_exit(&state, &snapshot) {
            Some(exit) => exit,
            None => self.risk.evaluate(&aggregated, &state, &snapshot),
        };
        trace.record_aggregate(aggregated);

        let decision = match verdict {
            Ok(decision) => decision,
            Err(veto) => return CycleOutcome::Skipped { veto },
        };
        if decision.action == Action::Buy {
            if let Err(veto) = self.risk.reserve_slot(symbol).await {
                return CycleOutcome::Skipped { veto };
            }
        }

        trace.enter(CycleState::Decided);
        if decision.is_hold() {
            return CycleOutcome::Held { decision };
        }

        trace.enter(CycleState::Executing);
        self.execute(decision, trace).await
    }

    /// Fan out to every provider through the cache and join until `deadline`
    async fn analyze(
        &self,
        symbol: &Symbol,
        snapshot: &Arc<MarketSnapshot>,
        deadline: Instant,
    ) -> (Vec<Signal>, BTreeMap<SignalSource, SourceStatus>) {
        let mut tasks = JoinSet::new();
        let mut pending = BTreeSet::new();

        for provider in self.providers.iter() {
            let source = provider.source();
            let key = CacheKey::new(
                symbol.clone(),
                source.as_str(),
                hash_params(&(provider.params_hash(), snapshot.version)),
            );
            let ttl = self.config.ttl_for(source);
            let cache = self.cache.clone();
            let provider = provider.clone();
            let symbol = symbol.clone();
            let snapshot = snapshot.clone();

            pending.insert(source);
            tasks.spawn(async move {
                let result = cache
                    .get_or_compute(key, ttl, move || async move {
                        produce_checked(provider.as_ref(), &symbol, &snapshot).await
                    })
                    .await;
                (source, result)
            });
        }

        let mut signals = Vec::with_capacity(pending.len());
        let mut excluded = BTreeMap::new();
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((source, result)))) => {
                    pending.remove(&source);
                    match result {
                        Ok(signal) => signals.push(signal),
                        Err(e) => {
                            let reason = match e {
                                CacheError::Compute(err) => err.to_string(),
                                CacheError::Interrupted => "computation interrupted".to_string(),
                            };
                            warn!("[ENGINE] {} {} provider failed: {}", symbol, source, reason);
                            excluded.insert(source, SourceStatus::Failed { reason });
                        }
                    }
                }
                Ok(Some(Err(e))) => warn!("[ENGINE] {} provider task ended abnormally: {}", symbol, e),
                Ok(None) => {
                    for source in std::mem::take(&mut pending) {
                        excluded.insert(
                            source,
                            SourceStatus::Failed {
                                reason: "provider task ended abnormally".into(),
                            },
                        );
                    }
                    break;
                }
                Err(_) => {
                    tasks.abort_all();
                    for source in std::mem::take(&mut pending) {
                        warn!("[ENGINE] {} {} provider timed out", symbol, source);
                        excluded.insert(source, SourceStatus::TimedOut);
                    }
                    break;
                }
            }
        }
        (signals, excluded)
    }

    async fn execute(&self, decision: TradeDecision, trace: &mut Trace) -> CycleOutcome {
        let ack = match self.submitter.submit(&decision).await {
            Ok(ack) => ack,
            Err(e) => {
                if decision.action == Action::Buy {
                    self.risk.release_slot(&decision.symbol).await;
                }
                error!(
                    "[ENGINE] {} {} decision {} not executed: {}",
                    decision.symbol, decision.action, decision.decision_id, e
                );
                return failed(trace, CycleError::Execution(e));
            }
        };

        // Accepted without fill details: book at the reference price
        let fill = ack
            .fill
            .clone()
            .unwrap_or_else(|| FillResult::new(decision.quantity, decision.price, self.clock.now()));
        if let Err(e) = self.risk.record_fill(&decision, &fill).await {
            if decision.action == Action::Buy {
                self.risk.release_slot(&decision.symbol).await;
            }
            return failed(trace, CycleError::Ledger(e));
        }

        CycleOutcome::Done {
            decision,
            order_id: ack.order_id,
        }
    }
}

fn failed(trace: &Trace, error: CycleError) -> CycleOutcome {
    CycleOutcome::Failed {
        stage: trace.current(),
        error,
    }
}
