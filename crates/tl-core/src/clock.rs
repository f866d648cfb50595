//! Time sources for controllers and loop drivers.
//!
//! A controller measures the interval between updates from a [`Clock`].
//! Live runs use [`WallClock`]; headless runs and tests drive a
//! [`ManualClock`] forward explicitly so elapsed intervals are exact.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic time source reporting seconds since an arbitrary origin.
pub trait Clock {
    fn now_s(&self) -> f64;
}

/// Wall-clock time measured from the moment the clock was created.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now_s(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start_s`.
    pub fn new(start_s: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_s.to_bits())),
        }
    }

    pub fn set(&self, t_s: f64) {
        self.bits.store(t_s.to_bits(), Ordering::Release);
    }

    /// Move the clock forward by `dt_s` and return the new time.
    pub fn advance(&self, dt_s: f64) -> f64 {
        let next = self.now_s() + dt_s;
        self.set(next);
        next
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_s(&self) -> f64 {
        (**self).now_s()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(0.0);
        let view = clock.clone();
        clock.advance(0.5);
        clock.advance(0.5);
        assert_eq!(view.now_s(), 1.0);

        view.set(10.0);
        assert_eq!(clock.now_s(), 10.0);
    }

    #[test]
    fn default_manual_clock_starts_at_zero() {
        assert_eq!(ManualClock::default().now_s(), 0.0);
    }

    #[test]
    fn wall_clock_is_monotonic() {
        let clock = WallClock::new();
        let a = clock.now_s();
        let b = clock.now_s();
        assert!(a >= 0.0);
        assert!(b >= a);
    }
}
