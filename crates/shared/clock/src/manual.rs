use chrono::{Duration, Utc};
use quorum_core::Timestamp;
use quorum_ports::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Clock that only advances when explicitly moved
///
/// Time is kept as a fixed origin plus an atomic offset in microseconds, so
/// `now()` never blocks and the clock can be shared across tasks.
#[derive(Debug)]
pub struct ManualClock {
    origin: Timestamp,
    offset_micros: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `start`
    pub fn new(start: Timestamp) -> Arc<Self> {
        Arc::new(Self {
            origin: start,
            offset_micros: AtomicI64::new(0),
        })
    }

    /// Create a clock frozen at the current wall time
    pub fn starting_now() -> Arc<Self> {
        Self::new(Utc::now())
    }

    /// Move time forward (or back, with a negative duration)
    pub fn advance(&self, by: Duration) {
        let micros = by.num_microseconds().unwrap_or(i64::MAX);
        self.offset_micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Jump to an absolute time
    pub fn set_time(&self, time: Timestamp) {
        let micros = (time - self.origin).num_microseconds().unwrap_or(0);
        self.offset_micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.origin + Duration::microseconds(self.offset_micros.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
