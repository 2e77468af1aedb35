use std::time::Duration;
use web_time::Instant;

use crate::error::{AppError, AppResult};

/// Recurring timer polled by the host loop.
///
/// Update N (1-based) becomes due at `start + N * period` and is never
/// reported earlier. A late poll reports only the most recent due index,
/// so a stalled loop does not replay a burst of stale updates.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    start: Instant,
    period: Duration,
    fired: u64,
    cancelled: bool,
}

impl IntervalTimer {
    /// Fails on a zero period
    pub fn new(start: Instant, period: Duration) -> AppResult<Self> {
        if period.is_zero() {
            return Err(AppError::InvalidInterval);
        }
        Ok(Self::with_period(start, period))
    }

    /// Timer with the countdown's one-second period
    pub fn every_second(start: Instant) -> Self {
        Self::with_period(
            start,
            Duration::from_millis(crate::constants::countdown::TICK_PERIOD_MS),
        )
    }

    fn with_period(start: Instant, period: Duration) -> Self {
        Self {
            start,
            period,
            fired: 0,
            cancelled: false,
        }
    }

    /// Returns the index of the update that became due since the last poll
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        if self.cancelled {
            return None;
        }

        let due = self.due_count(now);
        if due > self.fired {
            self.fired = due;
            Some(due)
        } else {
            None
        }
    }

    /// Instant at which the next update becomes due, `None` once cancelled
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.cancelled {
            return None;
        }
        let next = u32::try_from(self.fired + 1).ok()?;
        self.start.checked_add(self.period.checked_mul(next)?)
    }

    /// Stop producing updates; polls after this always return `None`
    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::debug!("[IntervalTimer] Cancelled after {} updates", self.fired);
        }
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn due_count(&self, now: Instant) -> u64 {
        let elapsed = now.saturating_duration_since(self.start);
        (elapsed.as_nanos() / self.period.as_nanos()) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_no_update_before_first_period() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::every_second(t0);

        assert_eq!(timer.poll(t0), None);
        assert_eq!(timer.poll(t0 + Duration::from_millis(999)), None);
        assert_eq!(timer.poll(t0 + SECOND), Some(1));
        assert_eq!(timer.poll(t0 + SECOND), None);
    }

    #[test]
    fn test_nth_update_never_early() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::every_second(t0);

        let mut now = t0;
        let step = Duration::from_millis(70);
        for _ in 0..200 {
            now += step;
            if let Some(n) = timer.poll(now) {
                let due_at = t0 + SECOND * n as u32;
                assert!(now >= due_at, "update {} produced early", n);
            }
        }
        assert_eq!(timer.fired(), 14);
    }

    #[test]
    fn test_late_poll_coalesces() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::every_second(t0);

        assert_eq!(timer.poll(t0 + SECOND * 5), Some(5));
        assert_eq!(timer.poll(t0 + Duration::from_millis(5_500)), None);
        assert_eq!(timer.poll(t0 + SECOND * 6), Some(6));
    }

    #[test]
    fn test_cancel_stops_updates() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::every_second(t0);

        assert_eq!(timer.poll(t0 + SECOND), Some(1));
        timer.cancel();
        assert!(timer.is_cancelled());
        assert_eq!(timer.poll(t0 + SECOND * 10), None);
        assert_eq!(timer.next_deadline(), None);
    }

    #[test]
    fn test_zero_period_is_rejected() {
        let t0 = Instant::now();
        assert!(matches!(
            IntervalTimer::new(t0, Duration::ZERO),
            Err(AppError::InvalidInterval)
        ));

        let mut timer = IntervalTimer::new(t0, Duration::from_millis(250)).unwrap();
        assert_eq!(timer.poll(t0 + SECOND), Some(4));
    }

    #[test]
    fn test_next_deadline_tracks_fired_updates() {
        let t0 = Instant::now();
        let mut timer = IntervalTimer::every_second(t0);

        assert_eq!(timer.next_deadline(), Some(t0 + SECOND));
        timer.poll(t0 + SECOND * 3);
        assert_eq!(timer.next_deadline(), Some(t0 + SECOND * 4));
    }
}
