//! Time source for expiry checks and key-set cache TTLs.
//!
//! Components that compare against "now" take an `Arc<dyn Clock>` so tests
//! can move time deterministically.

use chrono::{DateTime, Utc};
#[cfg(test)]
use chrono::TimeZone;
#[cfg(test)]
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Second resolution.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    unix_seconds: AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    /// Clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            unix_seconds: AtomicI64::new(start.timestamp()),
        }
    }

    /// Move the clock forward (or backward, for negative values).
    pub fn advance(&self, seconds: i64) {
        self.unix_seconds.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: DateTime<Utc>) {
        self.unix_seconds.store(now.timestamp(), Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.unix_seconds.load(Ordering::SeqCst), 0)
            .single()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc.timestamp_opt(1_700_000_000, 0).single().unwrap_or_default();
        let clock = ManualClock::new(start);

        assert_eq!(clock.now(), start);
        clock.advance(90);
        assert_eq!(clock.now().timestamp(), 1_700_000_090);
        clock.advance(-30);
        assert_eq!(clock.now().timestamp(), 1_700_000_060);
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::new(DateTime::<Utc>::default());
        let later = Utc.timestamp_opt(1_800_000_000, 0).single().unwrap_or_default();
        clock.set(later);
        assert_eq!(clock.now(), later);
    }

    #[test]
    fn test_system_clock_tracks_wall_time() {
        let before = Utc::now();
        let now = SystemClock.now();
        assert!(now >= before);
    }
}
