use chrono::Utc;
use quorum_core::Timestamp;
use quorum_ports::Clock;
use std::sync::Arc;

/// Wall clock for live sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Shared handle, ready to inject as `Arc<dyn Clock>`
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
