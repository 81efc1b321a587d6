//! Time provider abstraction
//!
//! Deck and card timestamps come from a [`Clock`] so that tests can control
//! `date_updated` ordering precisely. Timestamps are milliseconds since the
//! Unix epoch.
//!
//! # Example
//!
//! ```
//! use flashdeck::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let now = clock.now();
//! assert!(now > 0);
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// A time provider for entity timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as Timestamp)
            .unwrap_or(0)
    }
}

/// Formats a timestamp as RFC3339 for display.
pub fn format_timestamp(ts: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

/// Test clock with auto-advancing time.
///
/// Every call to [`Clock::now`] returns the current value and then advances by
/// one millisecond, so consecutive mutations always get strictly increasing
/// timestamps. Use [`FixedClock::hold`] to freeze it, e.g. to produce
/// `date_updated` ties.
#[cfg(any(test, feature = "testing"))]
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

#[cfg(any(test, feature = "testing"))]
struct FixedClockState {
    millis: Timestamp,
    held: bool,
}

/// RAII guard that freezes a [`FixedClock`] while held.
#[cfg(any(test, feature = "testing"))]
pub struct ClockHold<'a>(&'a FixedClock);

#[cfg(any(test, feature = "testing"))]
impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        self.0.lock().held = false;
    }
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a new fixed clock starting at the given time in milliseconds.
    pub fn new(millis: Timestamp) -> Self {
        Self {
            state: Mutex::new(FixedClockState {
                millis,
                held: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FixedClockState> {
        // A poisoned test clock is still a usable counter.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Freeze the clock until the returned guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.lock().held = true;
        ClockHold(self)
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: Timestamp) {
        self.lock().millis += ms;
    }

    /// Get the current time without advancing.
    pub fn get(&self) -> Timestamp {
        self.lock().millis
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        let mut state = self.lock();
        let t = state.millis;
        if !state.held {
            state.millis += 1;
        }
        t
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}

#[cfg(any(test, feature = "testing"))]
impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FixedClock")
            .field("millis", &state.millis)
            .field("held", &state.held)
            .finish()
    }
}
