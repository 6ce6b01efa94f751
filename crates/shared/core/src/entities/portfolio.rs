//! Portfolio state as seen by the risk manager
//!
//! The book is long-only: a position is a positive quantity bought at an
//! average entry price, marked to the latest snapshot price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{Price, Quantity, Symbol, Timestamp};

/// Open long position in one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub quantity: Quantity,
    /// Volume-weighted entry price
    pub entry_price: Price,
    /// Highest mark seen since entry (trailing stop anchor)
    pub peak_price: Price,
    /// Latest mark
    pub mark_price: Price,
    pub opened_at: Timestamp,
}

impl Position {
    pub fn open(symbol: impl Into<Symbol>, quantity: Quantity, price: Price, opened_at: Timestamp) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
            entry_price: price,
            peak_price: price,
            mark_price: price,
            opened_at,
        }
    }

    /// Add to the position, averaging the entry price
    pub fn add(&mut self, quantity: Quantity, price: Price) {
        let total = self.quantity + quantity;
        if !total.is_zero() {
            self.entry_price = (self.entry_price * self.quantity + price * quantity) / total;
        }
        self.quantity = total;
        self.mark(price);
    }

    /// Mark to a new price and track the peak
    pub fn mark(&mut self, price: Price) {
        self.mark_price = price;
        if price > self.peak_price {
            self.peak_price = price;
        }
    }

    pub fn market_value(&self) -> Decimal {
        self.quantity * self.mark_price
    }

    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.entry_price
    }

    pub fn unrealized_pnl(&self) -> Decimal {
        (self.mark_price - self.entry_price) * self.quantity
    }

    /// Return since entry as a fraction of entry price
    pub fn return_pct(&self) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.mark_price - self.entry_price) / self.entry_price
    }
}

/// Session profit and loss
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPnL {
    pub realized: Decimal,
    pub unrealized: Decimal,
    /// Fills recorded this session
    pub trades_today: u32,
}

impl DailyPnL {
    pub fn total(&self) -> Decimal {
        self.realized + self.unrealized
    }

    /// True when total PnL has reached `-max_daily_loss`
    pub fn loss_limit_breached(&self, max_daily_loss: Decimal) -> bool {
        self.total() <= -max_daily_loss
    }
}

/// Point-in-time copy of the book handed to `evaluate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub cash: Decimal,
    pub positions: BTreeMap<Symbol, Position>,
    pub daily: DailyPnL,
    pub as_of: Timestamp,
}

impl PortfolioState {
    pub fn new(cash: Decimal, as_of: Timestamp) -> Self {
        Self {
            cash,
            positions: BTreeMap::new(),
            daily: DailyPnL::default(),
            as_of,
        }
    }

    /// Cash plus marked value of every position
    pub fn portfolio_value(&self) -> Decimal {
        self.cash + self.positions.values().map(Position::market_value).sum::<Decimal>()
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn position(&self, symbol: &Symbol) -> Option<&Position> {
        self.positions.get(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_position_averaging_and_peak() {
        let mut pos = Position::open("AAPL", dec!(10), dec!(100), Utc::now());
        pos.add(dec!(10), dec!(110));
        assert_eq!(pos.entry_price, dec!(105));
        assert_eq!(pos.quantity, dec!(20));

        pos.mark(dec!(120));
        pos.mark(dec!(115));
        assert_eq!(pos.peak_price, dec!(120));
        assert_eq!(pos.unrealized_pnl(), dec!(200));
    }

    #[test]
    fn test_loss_limit_is_inclusive() {
        let pnl = DailyPnL {
            realized: dec!(-400),
            unrealized: dec!(-100),
            trades_today: 3,
        };
        assert!(pnl.loss_limit_breached(dec!(500)));
        assert!(!pnl.loss_limit_breached(dec!(501)));
    }

    #[test]
    fn test_portfolio_value_uses_marks() {
        let mut state = PortfolioState::new(dec!(1000), Utc::now());
        let mut pos = Position::open("BTC", dec!(2), dec!(50), Utc::now());
        pos.mark(dec!(60));
        state.positions.insert(pos.symbol.clone(), pos);

        assert_eq!(state.portfolio_value(), dec!(1120));
        assert_eq!(state.open_positions(), 1);
    }
}
