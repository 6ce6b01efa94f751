use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::values::{Price, Quantity, Symbol, Timestamp};

/// What a pipeline run decided to do with a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Action {
    pub fn is_directional(&self) -> bool {
        !matches!(self, Action::Hold)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Terminal output of one pipeline run
///
/// `decision_id` doubles as the idempotency token handed to the execution
/// gateway, so every retry of the same decision carries the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub decision_id: Uuid,
    pub symbol: Symbol,
    pub action: Action,
    /// Notional size in account currency (zero for HOLD)
    pub size: Decimal,
    /// Units to trade at `price`
    pub quantity: Quantity,
    /// Reference price the decision was sized at
    pub price: Price,
    pub rationale: String,
    pub decided_at: Timestamp,
}

impl TradeDecision {
    pub fn new(
        symbol: impl Into<Symbol>,
        action: Action,
        size: Decimal,
        quantity: Quantity,
        price: Price,
        decided_at: Timestamp,
    ) -> Self {
        Self {
            decision_id: Uuid::new_v4(),
            symbol: symbol.into(),
            action,
            size,
            quantity,
            price,
            rationale: String::new(),
            decided_at,
        }
    }

    /// A do-nothing decision at the given reference price
    pub fn hold(symbol: impl Into<Symbol>, price: Price, decided_at: Timestamp) -> Self {
        Self::new(symbol, Action::Hold, Decimal::ZERO, Decimal::ZERO, price, decided_at)
    }

    /// Builder: Set rationale
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn is_hold(&self) -> bool {
        self.action == Action::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_hold_has_no_size() {
        let decision = TradeDecision::hold("AAPL", dec!(180), Utc::now()).with_rationale("neutral");
        assert!(decision.is_hold());
        assert_eq!(decision.size, Decimal::ZERO);
        assert_eq!(decision.quantity, Decimal::ZERO);
        assert_eq!(decision.rationale, "neutral");
    }

    #[test]
    fn test_each_decision_gets_fresh_id() {
        let now = Utc::now();
        let a = TradeDecision::new("AAPL", Action::Buy, dec!(100), dec!(1), dec!(100), now);
        let b = TradeDecision::new("AAPL", Action::Buy, dec!(100), dec!(1), dec!(100), now);
        assert_ne!(a.decision_id, b.decision_id);
        assert!(a.action.is_directional());
        assert_eq!(serde_json::to_string(&Action::Sell).unwrap(), "\"SELL\"");
    }
}
