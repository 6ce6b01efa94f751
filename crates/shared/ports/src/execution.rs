use async_trait::async_trait;
use quorum_core::{OrderAck, OrderRequest};

use crate::error::ExecutionResult;

/// Port for order execution
///
/// Implementations must treat `request.idempotency_key` as the identity of
/// the order: a second submission with a key already seen returns the
/// original acknowledgement instead of placing a new order.
#[async_trait]
pub trait ExecutionGateway: Send + Sync {
    async fn submit_order(&self, request: &OrderRequest) -> ExecutionResult<OrderAck>;

    fn name(&self) -> &str {
        "ExecutionGateway"
    }
}
