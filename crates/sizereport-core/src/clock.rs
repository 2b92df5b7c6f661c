#![forbid(unsafe_code)]

//! Time sources for timer hosts.
//!
//! Production timer queues read `web_time::Instant::now()`. Tests drive a
//! [`LabClock`] by hand so every debounce and throttle window is
//! reproducible to the microsecond.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use web_time::{Duration, Instant};

/// A manually-advanceable clock for deterministic tests.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset_us: Arc<AtomicU64>,
}

impl LabClock {
    /// Create a lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the lab clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let us = delta.as_micros().min(u64::MAX as u128) as u64;
        self.offset_us.fetch_add(us, Ordering::Release);
    }

    /// Current lab time.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.epoch + self.elapsed()
    }

    /// Time elapsed since the clock was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.offset_us.load(Ordering::Acquire))
    }

    /// Elapsed time in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis().min(u64::MAX as u128) as u64
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a timer host reads the current time from.
#[derive(Debug, Clone, Default)]
pub enum Clock {
    /// Real wall-clock time.
    #[default]
    Real,
    /// Deterministic lab clock.
    Lab(LabClock),
}

impl Clock {
    #[must_use]
    pub fn now(&self) -> Instant {
        match self {
            Self::Real => Instant::now(),
            Self::Lab(c) => c.now(),
        }
    }

    /// Move a lab clock forward. Real clocks move on their own and ignore
    /// the request.
    pub fn advance(&self, delta: Duration) {
        if let Self::Lab(c) = self {
            c.advance(delta);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_lab(&self) -> bool {
        matches!(self, Self::Lab(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_clock_advance_accumulates() {
        let clock = LabClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_millis(100));
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now().duration_since(t0), Duration::from_millis(350));
        assert_eq!(clock.elapsed_ms(), 350);
    }

    #[test]
    fn clones_share_time() {
        let clock = LabClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(40));
        assert_eq!(other.elapsed_ms(), 40);
    }

    #[test]
    fn real_clock_ignores_advance() {
        let clock = Clock::Real;
        assert!(!clock.is_lab());
        let before = clock.now();
        clock.advance(Duration::from_secs(3600));
        assert!(clock.now().duration_since(before) < Duration::from_secs(3600));
    }

    #[test]
    fn lab_variant_advances_its_clock() {
        let lab = LabClock::new();
        let clock = Clock::Lab(lab.clone());
        assert!(clock.is_lab());
        clock.advance(Duration::from_millis(5));
        assert_eq!(lab.elapsed_ms(), 5);
    }
}
