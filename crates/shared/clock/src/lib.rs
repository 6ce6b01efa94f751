//! Quorum Clock Infrastructure
//!
//! Two implementations of the `Clock` port:
//!
//! - [`SystemClock`]: wall time, for live sessions
//! - [`ManualClock`]: frozen time that only moves when told to, so cache
//!   TTLs, cycle windows and trading hours can be tested deterministically
//!
//! ## Usage
//!
//! ```ignore
//! use quorum_clock::{ManualClock, Clock};
//! use chrono::Duration;
//!
//! let clock = ManualClock::new(start);
//! clock.advance(Duration::seconds(59));
//! assert_eq!(clock.now() - start, Duration::seconds(59));
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use quorum_ports::Clock;
