//! Risk Manager
//!
//! Owns the position/PnL ledger and turns aggregated signals into bounded
//! decisions:
//! - Sizes positions by confidence and volatility, capped per position
//! - Vetoes new trades on loss limit, position count and profit cap
//! - Fires stop-loss / take-profit / trailing-stop exits
//! - Records fills; the only writer of session PnL
//!
//! `evaluate` works on a [`PortfolioState`] copy taken before the risk
//! check, so it never holds the ledger lock. `record_fill` takes the write
//! lock for the whole update, so concurrent fills from different symbols
//! are applied one at a time. A BUY approved by `evaluate` reserves its
//! position slot before execution, so two symbols deciding concurrently
//! cannot both take the last slot.

use log::{debug, info, warn};
use quorum_core::{
    Action, AggregatedSignal, DailyPnL, FillResult, MarketSnapshot, PortfolioState, Position,
    Symbol, TradeDecision,
};
use quorum_ports::Clock;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result, Veto};
use crate::parameters::RiskConfig;

/// Which exit rule fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    TrailingStop,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop-loss"),
            ExitReason::TakeProfit => write!(f, "take-profit"),
            ExitReason::TrailingStop => write!(f, "trailing stop"),
        }
    }
}

#[derive(Debug)]
struct Ledger {
    cash: Decimal,
    positions: BTreeMap<Symbol, Position>,
    realized: Decimal,
    trades_today: u32,
    /// Symbols with a BUY between approval and fill
    reserved: BTreeSet<Symbol>,
}

/// Portfolio risk manager
pub struct RiskManager {
    config: RiskConfig,
    ledger: RwLock<Ledger>,
    clock: Arc<dyn Clock>,
}

impl RiskManager {
    pub fn new(config: RiskConfig, clock: Arc<dyn Clock>) -> Self {
        let ledger = Ledger {
            cash: config.starting_capital,
            positions: BTreeMap::new(),
            realized: Decimal::ZERO,
            trades_today: 0,
            reserved: BTreeSet::new(),
        };
        Self {
            config,
            ledger: RwLock::new(ledger),
            clock,
        }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Start a new session: zero realized PnL and the trade count
    ///
    /// Open positions carry over.
    pub async fn reset_session(&self) {
        let mut ledger = self.ledger.write().await;
        ledger.realized = Decimal::ZERO;
        ledger.trades_today = 0;
        info!(
            "[RISK] Session reset ({} open positions carried over)",
            ledger.positions.len()
        );
    }

    /// Mark a held position to the latest price
    pub async fn update_mark(&self, symbol: &Symbol, price: Decimal) {
        let mut ledger = self.ledger.write().await;
        if let Some(position) = ledger.positions.get_mut(symbol) {
            position.mark(price);
        }
    }

    /// Consistent copy of the book, with unrealized PnL from current marks
    pub async fn portfolio_state(&self) -> PortfolioState {
        let ledger = self.ledger.read().await;
        let unrealized = ledger
            .positions
            .values()
            .map(Position::unrealized_pnl)
            .sum::<Decimal>();
        PortfolioState {
            cash: ledger.cash,
            positions: ledger.positions.clone(),
            daily: DailyPnL {
                realized: ledger.realized,
                unrealized,
                trades_today: ledger.trades_today,
            },
            as_of: self.clock.now(),
        }
    }

    /// Claim a position slot for an approved BUY
    ///
    /// Counts open positions plus other in-flight BUYs against the limit.
    /// Released by the fill or by `release_slot` when execution fails.
    pub async fn reserve_slot(&self, symbol: &Symbol) -> std::result::Result<(), Veto> {
        let mut ledger = self.ledger.write().await;
        if ledger.positions.contains_key(symbol) || ledger.reserved.contains(symbol) {
            return Ok(());
        }
        let open = ledger.positions.len() + ledger.reserved.len();
        let max = self.config.limits.max_open_positions;
        if open >= max {
            let veto = Veto::MaxOpenPositions { open, max };
            info!("[RISK] {} BUY vetoed at reservation: {}", symbol, veto);
            return Err(veto);
        }
        ledger.reserved.insert(symbol.clone());
        Ok(())
    }

    pub async fn release_slot(&self, symbol: &Symbol) {
        self.ledger.write().await.reserved.remove(symbol);
    }

    /// Exit check for a held position; `None` when nothing is held or no rule fires
    ///
    /// An exit is a SELL of the full position, still subject to the daily
    /// loss veto.
    pub fn evaluate_exit(
        &self,
        state: &PortfolioState,
        snapshot: &MarketSnapshot,
    ) -> Option<std::result::Result<TradeDecision, Veto>> {
        let position = state.position(&snapshot.symbol)?;
        let reason = self.exit_reason(position, snapshot.price)?;

        if let Err(veto) = self.check_loss_limit(&state.daily) {
            info!("[RISK] {} {} exit vetoed: {}", snapshot.symbol, reason, veto);
            return Some(Err(veto));
        }

        info!(
            "[RISK] {} {} at {} (entry {}, peak {})",
            snapshot.symbol, reason, snapshot.price, position.entry_price, position.peak_price
        );
        Some(Ok(self.sell_all(position, snapshot, format!("{} exit", reason))))
    }

    fn exit_reason(&self, position: &Position, price: Decimal) -> Option<ExitReason> {
        let exits = &self.config.exits;
        let entry = position.entry_price;

        if price <= entry * (Decimal::ONE - exits.stop_loss_pct) {
            Some(ExitReason::StopLoss)
        } else if price >= entry * (Decimal::ONE + exits.take_profit_pct) {
            Some(ExitReason::TakeProfit)
        } else if exits.use_trailing_stop
            && price <= position.peak_price.max(price) * (Decimal::ONE - exits.trailing_stop_pct)
        {
            Some(ExitReason::TrailingStop)
        } else {
            None
        }
    }

    /// Turn an aggregated signal into a decision or a veto
    ///
    /// Vetoes are checked in order, first match wins:
    /// (a) daily loss limit reached: no BUY or SELL at all
    /// (b) open positions at the limit: no new BUY
    /// then the optional daily profit cap blocks new BUYs. Anything left
    /// that is neutral, under the confidence floor, or sizes to zero becomes
    /// a HOLD decision.
    pub fn evaluate(
        &self,
        aggregated: &AggregatedSignal,
        state: &PortfolioState,
        snapshot: &MarketSnapshot,
    ) -> std::result::Result<TradeDecision, Veto> {
        let symbol = &aggregated.symbol;
        let held = state.position(symbol);
        let direction = aggregated.direction;

        if direction.is_directional() {
            self.check_loss_limit(&state.daily)?;
        }

        if direction == Action::Buy && held.is_none() {
            let open = state.open_positions();
            let max = self.config.limits.max_open_positions;
            if open >= max {
                let veto = Veto::MaxOpenPositions { open, max };
                info!("[RISK] {} BUY vetoed: {}", symbol, veto);
                return Err(veto);
            }
            if let Some(cap) = self.config.limits.max_daily_profit {
                let total = state.daily.total();
                if total >= cap {
                    let veto = Veto::DailyProfitCap { total, cap };
                    info!("[RISK] {} BUY vetoed: {}", symbol, veto);
                    return Err(veto);
                }
            }
        }

        let hold = |why: &str| {
            debug!("[RISK] {} HOLD: {}", symbol, why);
            TradeDecision::hold(symbol.clone(), snapshot.price, self.clock.now()).with_rationale(why)
        };

        if !direction.is_directional() {
            let why = match &aggregated.degraded {
                Some(reason) => format!("degraded signal: {:?}", reason),
                None => format!("score {:.3} within neutral band", aggregated.weighted_score),
            };
            return Ok(hold(why.as_str()));
        }
        if aggregated.weighted_score.abs() <= self.config.neutral_band {
            return Ok(hold("score within neutral band"));
        }
        if aggregated.overall_confidence < self.config.confidence_floor {
            return Ok(hold("confidence below floor"));
        }

        match (direction, held) {
            (Action::Sell, Some(position)) => Ok(self.sell_all(
                position,
                snapshot,
                format!(
                    "sell signal {:.3} @ confidence {:.3}",
                    aggregated.weighted_score, aggregated.overall_confidence
                ),
            )),
            (Action::Sell, None) => Ok(hold("nothing to sell")),
            (Action::Buy, Some(_)) => Ok(hold("already positioned")),
            _ => {
                let (size, quantity) = self.size_position(aggregated, state, snapshot);
                if quantity.is_zero() {
                    return Ok(hold("size computed as zero"));
                }
                Ok(TradeDecision::new(
                    symbol.clone(),
                    Action::Buy,
                    size,
                    quantity,
                    snapshot.price,
                    self.clock.now(),
                )
                .with_rationale(format!(
                    "buy signal {:.3} @ confidence {:.3}, volatility {:.4}",
                    aggregated.weighted_score, aggregated.overall_confidence, snapshot.volatility
                )))
            }
        }
    }

    /// (notional, quantity) for a new position
    ///
    /// notional = fraction · portfolio value · confidence · volatility factor,
    /// capped at fraction · portfolio value and at available cash.
    pub fn size_position(
        &self,
        aggregated: &AggregatedSignal,
        state: &PortfolioState,
        snapshot: &MarketSnapshot,
    ) -> (Decimal, Decimal) {
        if snapshot.price <= Decimal::ZERO {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        let cap = self.config.limits.max_position_fraction * state.portfolio_value();
        let factor = self.config.sizing.volatility_factor(snapshot.volatility);
        let confidence = aggregated.overall_confidence.clamp(Decimal::ZERO, Decimal::ONE);

        let notional = (cap * confidence * factor)
            .min(cap)
            .min(state.cash)
            .max(Decimal::ZERO)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let quantity = (notional / snapshot.price).round_dp_with_strategy(8, RoundingStrategy::ToZero);
        if quantity.is_zero() {
            return (Decimal::ZERO, Decimal::ZERO);
        }
        (quantity * snapshot.price, quantity)
    }

    fn check_loss_limit(&self, daily: &DailyPnL) -> std::result::Result<(), Veto> {
        let limit = self.config.limits.max_daily_loss;
        if daily.loss_limit_breached(limit) {
            let veto = Veto::DailyLossLimit {
                total: daily.total(),
                limit,
            };
            info!("[RISK] vetoed: {}", veto);
            return Err(veto);
        }
        Ok(())
    }

    fn sell_all(&self, position: &Position, snapshot: &MarketSnapshot, why: String) -> TradeDecision {
        TradeDecision::new(
            position.symbol.clone(),
            Action::Sell,
            position.quantity * snapshot.price,
            position.quantity,
            snapshot.price,
            self.clock.now(),
        )
        .with_rationale(why)
    }

    /// Apply an acknowledged fill to the ledger
    ///
    /// BUY opens or adds to the position and spends cash; SELL closes (up to
    /// the held quantity) and books realized PnL against the entry price.
    pub async fn record_fill(&self, decision: &TradeDecision, fill: &FillResult) -> Result<()> {
        let mut ledger = self.ledger.write().await;
        let symbol = &decision.symbol;

        match decision.action {
            Action::Hold => return Ok(()),
            Action::Buy => {
                ledger.reserved.remove(symbol);
                ledger.cash -= fill.notional();
                match ledger.positions.get_mut(symbol) {
                    Some(position) => position.add(fill.quantity, fill.price),
                    None => {
                        let position =
                            Position::open(symbol.clone(), fill.quantity, fill.price, fill.filled_at);
                        ledger.positions.insert(symbol.clone(), position);
                    }
                }
            }
            Action::Sell => {
                let Some(position) = ledger.positions.get_mut(symbol) else {
                    warn!("[RISK] SELL fill for {} with no open position", symbol);
                    return Err(Error::NoPosition(symbol.clone()));
                };
                let quantity = fill.quantity.min(position.quantity);
                let pnl = (fill.price - position.entry_price) * quantity;
                position.quantity -= quantity;
                let closed = position.quantity <= Decimal::ZERO;
                if closed {
                    ledger.positions.remove(symbol);
                }
                ledger.cash += fill.price * quantity;
                ledger.realized += pnl;
            }
        }
        ledger.trades_today += 1;

        info!(
            "[RISK] Fill {} {} {} @ {} | cash={} realized={} trades={}",
            decision.action,
            fill.quantity,
            symbol,
            fill.price,
            ledger.cash.round_dp(2),
            ledger.realized.round_dp(2),
            ledger.trades_today
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quorum_clock::ManualClock;
    use quorum_core::{Degradation, SourceContribution};
    use rust_decimal_macros::dec;

    fn manager() -> RiskManager {
        RiskManager::new(RiskConfig::default(), ManualClock::new(Utc::now()))
    }

    fn aggregated(symbol: &str, score: Decimal, confidence: Decimal) -> AggregatedSignal {
        let direction = if score > dec!(0.1) {
            Action::Buy
        } else if score < dec!(-0.1) {
            Action::Sell
        } else {
            Action::Hold
        };
        AggregatedSignal {
            symbol: Symbol::from(symbol),
            weighted_score: score,
            overall_confidence: confidence,
            contributing_sources: Vec::<SourceContribution>::new(),
            direction,
            degraded: None,
            computed_at: Utc::now(),
        }
    }

    fn snapshot(symbol: &str, price: Decimal, volatility: Decimal) -> MarketSnapshot {
        MarketSnapshot::new(symbol, price, dec!(1000), Utc::now()).with_volatility(volatility)
    }

    fn state_with_pnl(realized: Decimal) -> PortfolioState {
        let mut state = PortfolioState::new(dec!(10_000), Utc::now());
        state.daily.realized = realized;
        state
    }

    fn held(state: &mut PortfolioState, symbol: &str, qty: Decimal, entry: Decimal, mark: Decimal) {
        let mut position = Position::open(symbol, qty, entry, Utc::now());
        position.mark(mark);
        state.positions.insert(Symbol::from(symbol), position);
    }

    #[test]
    fn test_loss_limit_vetoes_every_direction() {
        let rm = manager();
        let state = state_with_pnl(dec!(-520));
        let snap = snapshot("AAPL", dec!(100), Decimal::ZERO);

        for score in [dec!(0.9), dec!(-0.9)] {
            let result = rm.evaluate(&aggregated("AAPL", score, dec!(1)), &state, &snap);
            assert!(matches!(result, Err(Veto::DailyLossLimit { .. })));
        }

        // HOLD is still allowed through
        let hold = rm
            .evaluate(&aggregated("AAPL", dec!(0.05), dec!(1)), &state, &snap)
            .unwrap();
        assert!(hold.is_hold());
    }

    #[test]
    fn test_unrealized_loss_counts_toward_limit() {
        let rm = manager();
        let mut state = state_with_pnl(dec!(-300));
        held(&mut state, "MSFT", dec!(10), dec!(100), dec!(80));
        state.daily.unrealized = dec!(-200);

        let result = rm.evaluate(
            &aggregated("AAPL", dec!(0.9), dec!(1)),
            &state,
            &snapshot("AAPL", dec!(100), Decimal::ZERO),
        );
        assert_eq!(
            result,
            Err(Veto::DailyLossLimit {
                total: dec!(-500),
                limit: dec!(500)
            })
        );
    }

    #[test]
    fn test_open_position_limit_vetoes_new_buy() {
        let rm = manager();
        let mut state = state_with_pnl(Decimal::ZERO);
        for s in ["A", "B", "C", "D", "E"] {
            held(&mut state, s, dec!(1), dec!(10), dec!(10));
        }

        let result = rm.evaluate(
            &aggregated("AAPL", dec!(0.9), dec!(1)),
            &state,
            &snapshot("AAPL", dec!(100), Decimal::ZERO),
        );
        assert_eq!(result, Err(Veto::MaxOpenPositions { open: 5, max: 5 }));
    }

    #[test]
    fn test_buy_sizing_uses_confidence_and_volatility() {
        let rm = manager();
        let state = state_with_pnl(Decimal::ZERO);

        let decision = rm
            .evaluate(
                &aggregated("AAPL", dec!(0.7), dec!(0.8)),
                &state,
                &snapshot("AAPL", dec!(100), dec!(0.1)),
            )
            .unwrap();

        // 10_000 · 0.10 · 0.8 · (1 - 2·0.1)
        assert_eq!(decision.action, Action::Buy);
        assert_eq!(decision.size, dec!(640));
        assert_eq!(decision.quantity, dec!(6.4));
        assert!(decision.size <= dec!(1000));
    }

    #[test]
    fn test_size_never_exceeds_position_cap() {
        let rm = manager();
        let state = state_with_pnl(Decimal::ZERO);
        let (size, _) = rm.size_position(
            &aggregated("AAPL", dec!(1), dec!(5)),
            &state,
            &snapshot("AAPL", dec!(3), Decimal::ZERO),
        );
        assert!(size <= dec!(1000));
    }

    #[test]
    fn test_long_only_holds() {
        let rm = manager();
        let mut state = state_with_pnl(Decimal::ZERO);
        let snap = snapshot("AAPL", dec!(100), Decimal::ZERO);

        let nothing = rm
            .evaluate(&aggregated("AAPL", dec!(-0.8), dec!(0.9)), &state, &snap)
            .unwrap();
        assert_eq!(nothing.rationale, "nothing to sell");

        held(&mut state, "AAPL", dec!(3), dec!(100), dec!(100));
        let already = rm
            .evaluate(&aggregated("AAPL", dec!(0.8), dec!(0.9)), &state, &snap)
            .unwrap();
        assert_eq!(already.rationale, "already positioned");

        let sell = rm
            .evaluate(&aggregated("AAPL", dec!(-0.8), dec!(0.9)), &state, &snap)
            .unwrap();
        assert_eq!(sell.action, Action::Sell);
        assert_eq!(sell.quantity, dec!(3));
    }

    #[test]
    fn test_low_confidence_never_trades() {
        let rm = manager();
        let state = state_with_pnl(Decimal::ZERO);
        let mut agg = aggregated("AAPL", dec!(0.9), dec!(0.2));
        agg.degraded = None;

        let decision = rm
            .evaluate(&agg, &state, &snapshot("AAPL", dec!(100), Decimal::ZERO))
            .unwrap();
        assert!(decision.is_hold());

        agg.direction = Action::Hold;
        agg.weighted_score = Decimal::ZERO;
        agg.degraded = Some(Degradation::BelowQuorum {
            present: 1,
            required: 2,
        });
        let decision = rm
            .evaluate(&agg, &state, &snapshot("AAPL", dec!(100), Decimal::ZERO))
            .unwrap();
        assert!(decision.is_hold());
    }

    #[test]
    fn test_profit_cap_blocks_buys_only() {
        let mut config = RiskConfig::default();
        config.limits.max_daily_profit = Some(dec!(200));
        let rm = RiskManager::new(config, ManualClock::new(Utc::now()));
        let mut state = state_with_pnl(dec!(250));
        let snap = snapshot("AAPL", dec!(100), Decimal::ZERO);

        let buy = rm.evaluate(&aggregated("AAPL", dec!(0.9), dec!(1)), &state, &snap);
        assert!(matches!(buy, Err(Veto::DailyProfitCap { .. })));

        held(&mut state, "AAPL", dec!(1), dec!(100), dec!(100));
        let sell = rm
            .evaluate(&aggregated("AAPL", dec!(-0.9), dec!(1)), &state, &snap)
            .unwrap();
        assert_eq!(sell.action, Action::Sell);
    }

    #[test]
    fn test_exit_rules() {
        let rm = manager();
        let mut state = state_with_pnl(Decimal::ZERO);
        held(&mut state, "AAPL", dec!(2), dec!(100), dec!(100));

        let stop = rm
            .evaluate_exit(&state, &snapshot("AAPL", dec!(97), Decimal::ZERO))
            .unwrap()
            .unwrap();
        assert_eq!(stop.action, Action::Sell);
        assert_eq!(stop.quantity, dec!(2));
        assert_eq!(stop.rationale, "stop-loss exit");

        let take = rm
            .evaluate_exit(&state, &snapshot("AAPL", dec!(106), Decimal::ZERO))
            .unwrap()
            .unwrap();
        assert_eq!(take.rationale, "take-profit exit");

        assert!(rm.evaluate_exit(&state, &snapshot("AAPL", dec!(101), Decimal::ZERO)).is_none());
        assert!(rm.evaluate_exit(&state, &snapshot("MSFT", dec!(1), Decimal::ZERO)).is_none());

        // Peak at 104, now 101.5: more than 2% off the peak, still above stop-loss
        held(&mut state, "AAPL", dec!(2), dec!(100), dec!(104));
        let trail = rm
            .evaluate_exit(&state, &snapshot("AAPL", dec!(101.5), Decimal::ZERO))
            .unwrap()
            .unwrap();
        assert_eq!(trail.rationale, "trailing stop exit");
    }

    #[test]
    fn test_exit_respects_loss_limit() {
        let rm = manager();
        let mut state = state_with_pnl(dec!(-600));
        held(&mut state, "AAPL", dec!(2), dec!(100), dec!(100));

        let exit = rm.evaluate_exit(&state, &snapshot("AAPL", dec!(90), Decimal::ZERO));
        assert!(matches!(exit, Some(Err(Veto::DailyLossLimit { .. }))));
    }

    #[tokio::test]
    async fn test_fills_update_ledger() {
        let rm = manager();
        let now = Utc::now();
        let buy = TradeDecision::new("AAPL", Action::Buy, dec!(1000), dec!(10), dec!(100), now);
        rm.record_fill(&buy, &FillResult::new(dec!(10), dec!(100), now))
            .await
            .unwrap();

        rm.update_mark(&Symbol::from("AAPL"), dec!(90)).await;
        let state = rm.portfolio_state().await;
        assert_eq!(state.cash, dec!(9000));
        assert_eq!(state.daily.unrealized, dec!(-100));
        assert_eq!(state.portfolio_value(), dec!(9900));

        let sell = TradeDecision::new("AAPL", Action::Sell, dec!(900), dec!(10), dec!(90), now);
        rm.record_fill(&sell, &FillResult::new(dec!(10), dec!(90), now))
            .await
            .unwrap();

        let state = rm.portfolio_state().await;
        assert_eq!(state.daily.realized, dec!(-100));
        assert_eq!(state.daily.trades_today, 2);
        assert_eq!(state.open_positions(), 0);
        assert_eq!(state.cash, dec!(9900));

        let orphan = rm.record_fill(&sell, &FillResult::new(dec!(1), dec!(90), now)).await;
        assert_eq!(orphan, Err(Error::NoPosition(Symbol::from("AAPL"))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fills_are_serialized() {
        let rm = Arc::new(manager());
        let now = Utc::now();

        let mut handles = Vec::new();
        for i in 0..20 {
            let rm = rm.clone();
            handles.push(tokio::spawn(async move {
                let symbol = format!("SYM{}", i % 4);
                let decision = TradeDecision::new(symbol, Action::Buy, dec!(10), dec!(1), dec!(10), now);
                rm.record_fill(&decision, &FillResult::new(dec!(1), dec!(10), now))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let state = rm.portfolio_state().await;
        assert_eq!(state.daily.trades_today, 20);
        assert_eq!(state.cash, dec!(9800));
        assert_eq!(state.open_positions(), 4);
        assert!(state.positions.values().all(|p| p.quantity == dec!(5)));
    }

    #[tokio::test]
    async fn test_reservations_count_against_open_limit() {
        let mut config = RiskConfig::default();
        config.limits.max_open_positions = 2;
        let rm = RiskManager::new(config, ManualClock::new(Utc::now()));
        let now = Utc::now();

        rm.reserve_slot(&Symbol::from("AAPL")).await.unwrap();
        rm.reserve_slot(&Symbol::from("MSFT")).await.unwrap();
        // Re-reserving a symbol already in flight is free
        rm.reserve_slot(&Symbol::from("AAPL")).await.unwrap();
        assert_eq!(
            rm.reserve_slot(&Symbol::from("TSLA")).await,
            Err(Veto::MaxOpenPositions { open: 2, max: 2 })
        );

        rm.release_slot(&Symbol::from("MSFT")).await;
        rm.reserve_slot(&Symbol::from("TSLA")).await.unwrap();

        let buy = TradeDecision::new("AAPL", Action::Buy, dec!(100), dec!(1), dec!(100), now);
        rm.record_fill(&buy, &FillResult::new(dec!(1), dec!(100), now))
            .await
            .unwrap();
        assert_eq!(
            rm.reserve_slot(&Symbol::from("GOOGL")).await,
            Err(Veto::MaxOpenPositions { open: 2, max: 2 })
        );
    }

    #[tokio::test]
    async fn test_reset_session_keeps_positions() {
        let rm = manager();
        let now = Utc::now();
        let buy = TradeDecision::new("AAPL", Action::Buy, dec!(100), dec!(1), dec!(100), now);
        rm.record_fill(&buy, &FillResult::new(dec!(1), dec!(100), now))
            .await
            .unwrap();

        rm.reset_session().await;
        let state = rm.portfolio_state().await;
        assert_eq!(state.daily.trades_today, 0);
        assert_eq!(state.daily.realized, Decimal::ZERO);
        assert_eq!(state.open_positions(), 1);
    }
}
