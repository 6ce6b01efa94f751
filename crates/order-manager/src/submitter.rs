//! Order submission with bounded retry
//!
//! Every attempt for one decision carries the same idempotency key (the
//! decision id), so a retry after a lost acknowledgement cannot place a
//! second order at a gateway that honours the key.

use log::{error, info, warn};
use quorum_core::{OrderAck, OrderRequest, TradeDecision};
use quorum_ports::{ExecutionError, ExecutionGateway};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Retry policy for gateway submissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Per-attempt deadline; an attempt past it counts as a timeout
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 2_000,
            attempt_timeout_ms: 5_000,
        }
    }
}

/// Submits decisions to an execution gateway
pub struct OrderSubmitter {
    gateway: Arc<dyn ExecutionGateway>,
    policy: RetryPolicy,
}

impl OrderSubmitter {
    pub fn new(gateway: Arc<dyn ExecutionGateway>, policy: RetryPolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Submit a directional decision, retrying transient failures
    ///
    /// Rejections are final. Transient failures (timeouts, unavailability)
    /// are retried with doubling backoff until `max_attempts` is reached,
    /// at which point the last error is returned.
    pub async fn submit(&self, decision: &TradeDecision) -> Result<OrderAck, ExecutionError> {
        let request = OrderRequest::from_decision(decision);
        let max_attempts = self.policy.max_attempts.max(1);
        let attempt_timeout = Duration::from_millis(self.policy.attempt_timeout_ms);
        let max_backoff = Duration::from_millis(self.policy.max_backoff_ms);
        let mut backoff = Duration::from_millis(self.policy.initial_backoff_ms);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match timeout(attempt_timeout, self.gateway.submit_order(&request)).await {
                Ok(result) => result,
                Err(_) => Err(ExecutionError::Timeout),
            };

            let err = match result {
                Ok(ack) if ack.accepted => {
                    info!(
                        "[EXEC] {} {} {} accepted as {} (attempt {})",
                        request.action, request.quantity, request.symbol, ack.order_id, attempt
                    );
                    return Ok(ack);
                }
                Ok(ack) => ExecutionError::Rejected(format!("order {} not accepted", ack.order_id)),
                Err(e) => e,
            };

            if !err.is_retryable() {
                warn!("[EXEC] {} rejected by {}: {}", request.symbol, self.gateway.name(), err);
                return Err(err);
            }
            if attempt >= max_attempts {
                error!(
                    "[EXEC] {} decision {} failed after {} attempts: {}",
                    request.symbol, request.idempotency_key, attempt, err
                );
                return Err(err);
            }

            warn!(
                "[EXEC] {} attempt {} failed: {}. Retrying in {:?}",
                request.symbol, attempt, err, backoff
            );
            sleep(backoff).await;
            backoff = (backoff * 2).min(max_backoff);
        }
    }
}
