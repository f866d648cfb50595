//! Fixed-period tick scheduling for live loops.
//!
//! The loop runs a tick, then waits until the next deadline. Deadlines are
//! spaced one period apart; when a tick overruns its slot the missed
//! deadlines are dropped instead of replayed in a burst.

use std::time::{Duration, Instant};

/// Tracks when the next tick of a fixed-period loop is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    period: Duration,
    next_tick: Instant,
}

impl TickSchedule {
    /// Schedule whose first deadline is one period after `start`.
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next_tick: start + period,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Move to the following deadline. Returns the number of deadlines
    /// skipped because `now` is already past them.
    pub fn advance(&mut self, now: Instant) -> u32 {
        self.next_tick += self.period;
        let mut skipped = 0;
        while self.next_tick <= now && !self.period.is_zero() {
            self.next_tick += self.period;
            skipped += 1;
        }
        skipped
    }

    /// Time left until the next deadline.
    pub fn time_until_tick(&self, now: Instant) -> Duration {
        self.next_tick.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_deadline_is_one_period_out() {
        let start = Instant::now();
        let schedule = TickSchedule::new(Duration::from_millis(500), start);
        assert_eq!(schedule.period(), Duration::from_millis(500));
        assert_eq!(schedule.next_tick(), start + Duration::from_millis(500));
        assert_eq!(schedule.time_until_tick(start), Duration::from_millis(500));
    }

    #[test]
    fn advance_steps_one_period() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(Duration::from_millis(500), start);
        let skipped = schedule.advance(start + Duration::from_millis(510));
        assert_eq!(skipped, 0);
        assert_eq!(schedule.next_tick(), start + Duration::from_millis(1000));
        assert_eq!(
            schedule.time_until_tick(start + Duration::from_millis(600)),
            Duration::from_millis(400)
        );
    }

    #[test]
    fn overrun_skips_missed_deadlines() {
        let start = Instant::now();
        let mut schedule = TickSchedule::new(Duration::from_millis(500), start);
        let skipped = schedule.advance(start + Duration::from_millis(1700));
        assert_eq!(skipped, 2);
        assert_eq!(schedule.next_tick(), start + Duration::from_millis(2000));
    }

    #[test]
    fn time_until_tick_saturates() {
        let start = Instant::now();
        let schedule = TickSchedule::new(Duration::from_millis(100), start);
        assert_eq!(
            schedule.time_until_tick(start + Duration::from_secs(1)),
            Duration::ZERO
        );
    }
}
