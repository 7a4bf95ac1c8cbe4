//! Time injection for expiration arithmetic.
//!
//! All expiration math in the engine goes through a [`Clock`] so tests can
//! pin "now" to a known instant. The in-memory secret store uses the same
//! source for its `created_on`/`updated_on` stamps.

use chrono::{DateTime, Utc};
use std::sync::RwLock;

/// A monotonic-enough source of the current UTC time.
///
/// Implementations must be `Send + Sync`; a clock is shared read-only across
/// concurrent rotations.
pub trait Clock: Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time. The only clock used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an instant that tests can move by hand.
///
/// # Example
///
/// ```
/// use rotavault::clock::{Clock, ManualClock};
/// use chrono::{TimeZone, Utc};
///
/// let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 4, 30, 0, 0, 0).unwrap());
/// clock.advance(chrono::Duration::days(32));
/// assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Creates a clock pinned to `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock forward (or backward, with a negative duration).
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.write().unwrap();
        *now = *now + by;
    }

    /// Re-pins the clock to a new instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}
