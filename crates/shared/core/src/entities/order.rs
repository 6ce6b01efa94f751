use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decision::{Action, TradeDecision};
use crate::values::{Price, Quantity, Symbol, Timestamp};

/// Order request sent to an execution gateway
///
/// Built from a directional decision. The idempotency key is the decision id,
/// so resubmitting the same request after a timeout cannot double-fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub idempotency_key: Uuid,
    pub symbol: Symbol,
    pub action: Action,
    pub quantity: Quantity,
    /// Reference price (market orders fill near it)
    pub price: Price,
}

impl OrderRequest {
    pub fn from_decision(decision: &TradeDecision) -> Self {
        Self {
            idempotency_key: decision.decision_id,
            symbol: decision.symbol.clone(),
            action: decision.action,
            quantity: decision.quantity,
            price: decision.price,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// What actually traded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillResult {
    pub quantity: Quantity,
    pub price: Price,
    pub filled_at: Timestamp,
}

impl FillResult {
    pub fn new(quantity: Quantity, price: Price, filled_at: Timestamp) -> Self {
        Self {
            quantity,
            price,
            filled_at,
        }
    }

    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// Gateway acknowledgement of a submitted order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAck {
    pub accepted: bool,
    pub order_id: String,
    /// Present when the order filled synchronously
    pub fill: Option<FillResult>,
}

impl OrderAck {
    pub fn filled(order_id: impl Into<String>, fill: FillResult) -> Self {
        Self {
            accepted: true,
            order_id: order_id.into(),
            fill: Some(fill),
        }
    }

    pub fn accepted(order_id: impl Into<String>) -> Self {
        Self {
            accepted: true,
            order_id: order_id.into(),
            fill: None,
        }
    }
}
