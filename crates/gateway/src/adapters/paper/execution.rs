//! Paper execution gateway
//!
//! Fills every accepted order immediately at the request price, adjusted
//! by a fixed slippage. Orders are keyed by their idempotency key: a
//! resubmission returns the original acknowledgement and places nothing.
//!
//! Faults can be queued to exercise the submitter's retry path:
//! - `Fault::Fail`: the attempt fails before the order is placed
//! - `Fault::LoseAck`: the order is placed but the caller sees a timeout

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, info};
use quorum_core::{Action, FillResult, OrderAck, OrderRequest};
use quorum_ports::{Clock, ExecutionError, ExecutionGateway, ExecutionResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Configuration for [`PaperExecutionGateway`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperExecutionConfig {
    /// Adverse price adjustment in basis points
    pub slippage_bps: Decimal,
    /// Simulated round-trip latency per submission
    pub latency_ms: u64,
}

/// Injected failure for the next submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Fail(ExecutionError),
    LoseAck,
}

pub struct PaperExecutionGateway {
    config: PaperExecutionConfig,
    clock: Arc<dyn Clock>,
    orders: DashMap<Uuid, OrderAck>,
    faults: Mutex<VecDeque<Fault>>,
    next_order_id: AtomicU64,
    submissions: AtomicU64,
}

impl PaperExecutionGateway {
    pub fn new(config: PaperExecutionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            orders: DashMap::new(),
            faults: Mutex::new(VecDeque::new()),
            next_order_id: AtomicU64::new(1),
            submissions: AtomicU64::new(0),
        }
    }

    /// Queue a fault for an upcoming submission (FIFO)
    pub async fn inject(&self, fault: Fault) {
        self.faults.lock().await.push_back(fault);
    }

    /// Distinct orders placed (duplicates excluded)
    pub fn orders_placed(&self) -> usize {
        self.orders.len()
    }

    /// Submission attempts seen, including duplicates and failures
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn ack_for(&self, key: &Uuid) -> Option<OrderAck> {
        self.orders.get(key).map(|ack| ack.clone())
    }

    fn fill_price(&self, request: &OrderRequest) -> Decimal {
        let slip = request.price * self.config.slippage_bps / Decimal::from(10_000);
        match request.action {
            Action::Buy => request.price + slip,
            Action::Sell => request.price - slip,
            Action::Hold => request.price,
        }
    }
}

#[async_trait]
impl ExecutionGateway for PaperExecutionGateway {
    async fn submit_order(&self, request: &OrderRequest) -> ExecutionResult<OrderAck> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let fault = self.faults.lock().await.pop_front();
        if let Some(Fault::Fail(err)) = &fault {
            debug!("[PAPER] Injected failure for {}: {}", request.idempotency_key, err);
            return Err(err.clone());
        }

        if !request.action.is_directional() {
            return Err(ExecutionError::Rejected("HOLD is not an order".into()));
        }
        if request.quantity <= Decimal::ZERO || request.price <= Decimal::ZERO {
            return Err(ExecutionError::Rejected(format!(
                "invalid order: {} @ {}",
                request.quantity, request.price
            )));
        }

        let ack = self
            .orders
            .entry(request.idempotency_key)
            .or_insert_with(|| {
                let id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
                let fill = FillResult::new(request.quantity, self.fill_price(request), self.clock.now());
                info!(
                    "[PAPER] Filled {} {} {} @ {} (paper-{})",
                    request.action, fill.quantity, request.symbol, fill.price, id
                );
                OrderAck::filled(format!("paper-{}", id), fill)
            })
            .clone();

        if fault == Some(Fault::LoseAck) {
            debug!("[PAPER] Dropping ack for {}", ack.order_id);
            return Err(ExecutionError::Timeout);
        }
        Ok(ack)
    }

    fn name(&self) -> &str {
        "paper"
    }
}
