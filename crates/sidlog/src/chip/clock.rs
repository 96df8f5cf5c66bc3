//! Access timing.
//!
//! The host scheduler owns global time. A chip only asks it for the current
//! absolute cycle count (`ClockSource::now`) and keeps the time of its own
//! last logged access in an `AccessClock`.
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ClockRegression;

/// Current absolute cycle count of the host scheduler.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> u64;
}

/// A clock source the host advances by hand.
///
/// Useful for hosts that already track cycles in a plain counter and for
/// tests.
#[derive(Debug, Default)]
pub struct SharedClock {
    cycles: AtomicU64,
}

impl SharedClock {
    pub fn new(cycles: u64) -> Self {
        Self {
            cycles: AtomicU64::new(cycles),
        }
    }

    pub fn set(&self, cycles: u64) {
        self.cycles.store(cycles, Ordering::Relaxed);
    }

    pub fn advance(&self, cycles: u64) {
        self.cycles.fetch_add(cycles, Ordering::Relaxed);
    }
}

impl ClockSource for SharedClock {
    fn now(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }
}

/// Last access time and the delta to the access before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessClock {
    last: u64,
    delta: u64,
}

impl AccessClock {
    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn delta(&self) -> u64 {
        self.delta
    }

    /// Move to `now`, returning the cycles elapsed since the last access.
    ///
    /// Fails without changing state if `now` is before the last access.
    pub fn advance(&mut self, now: u64) -> Result<u64, ClockRegression> {
        if now < self.last {
            return Err(ClockRegression {
                now,
                last: self.last,
            });
        }
        self.delta = now - self.last;
        self.last = now;
        Ok(self.delta)
    }

    pub fn reset(&mut self) {
        self.last = 0;
        self.delta = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_forward() {
        let mut clock = AccessClock::default();
        assert_eq!(clock.advance(10), Ok(10));
        assert_eq!(clock.advance(10), Ok(0));
        assert_eq!(clock.advance(0x1_0010), Ok(0x1_0006));
        assert_eq!(clock.last(), 0x1_0010);
        assert_eq!(clock.delta(), 0x1_0006);
    }

    #[test]
    fn test_advance_backwards_is_detected() {
        let mut clock = AccessClock::default();
        clock.advance(100).unwrap();
        assert_eq!(
            clock.advance(99),
            Err(ClockRegression { now: 99, last: 100 })
        );
        // state is untouched
        assert_eq!(clock.last(), 100);
        assert_eq!(clock.delta(), 100);
    }

    #[test]
    fn test_reset() {
        let mut clock = AccessClock::default();
        clock.advance(500).unwrap();
        clock.reset();
        assert_eq!(clock, AccessClock::default());
    }

    #[test]
    fn test_shared_clock() {
        let clock = SharedClock::new(5);
        clock.advance(10);
        assert_eq!(clock.now(), 15);
        clock.set(2);
        assert_eq!(clock.now(), 2);
    }
}
