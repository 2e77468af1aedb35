//! Plain-text countdown
//!
//! Prints the label immediately, then once per second.

use chrono::{DateTime, Utc};
use std::io::Write;
use web_time::Instant;

use crate::countdown::{Countdown, IntervalTimer};
use crate::error::AppResult;

/// Time source for the text loop
pub trait Clock {
    /// Monotonic time for scheduling
    fn now(&self) -> Instant;
    /// Wall-clock time for the countdown itself
    fn wall(&self) -> DateTime<Utc>;
    fn sleep_until(&mut self, deadline: Instant);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep_until(&mut self, deadline: Instant) {
        let wait = deadline.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            std::thread::sleep(wait);
        }
    }
}

/// Print countdown lines to `out`; stops after `ticks` lines when given
pub fn run_with_clock<W: Write, C: Clock>(
    countdown: &Countdown,
    ticks: Option<u64>,
    out: &mut W,
    clock: &mut C,
) -> AppResult<u64> {
    let mut timer = IntervalTimer::every_second(clock.now());
    let mut printed = 0u64;

    loop {
        if ticks.is_some_and(|limit| printed >= limit) {
            break;
        }

        writeln!(out, "{}", countdown.remaining_at(clock.wall()).label())?;
        out.flush()?;
        printed += 1;

        if ticks.is_some_and(|limit| printed >= limit) {
            break;
        }

        let Some(next) = timer.next_deadline() else {
            break;
        };
        clock.sleep_until(next);
        // Slept past several periods: print once, not a burst
        while timer.poll(clock.now()).is_none() {
            match timer.next_deadline() {
                Some(next) => clock.sleep_until(next),
                None => return Ok(printed),
            }
        }
    }

    log::debug!("[text_mode] Printed {} updates", printed);
    Ok(printed)
}

/// Run against the system clock and stdout
pub fn run(countdown: &Countdown, ticks: Option<u64>) -> AppResult<u64> {
    log::info!("[text_mode] Counting down to {}", countdown.deadline);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_clock(countdown, ticks, &mut out, &mut SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::{Deadline, PastDeadline};
    use std::time::Duration;

    struct FakeClock {
        base: Instant,
        offset: Duration,
        wall_base: DateTime<Utc>,
        sleeps: u32,
    }

    impl FakeClock {
        fn new(wall_base: DateTime<Utc>) -> Self {
            Self {
                base: Instant::now(),
                offset: Duration::ZERO,
                wall_base,
                sleeps: 0,
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.base + self.offset
        }

        fn wall(&self) -> DateTime<Utc> {
            self.wall_base + chrono::Duration::milliseconds(self.offset.as_millis() as i64)
        }

        fn sleep_until(&mut self, deadline: Instant) {
            self.sleeps += 1;
            self.offset = deadline.saturating_duration_since(self.base);
        }
    }

    #[test]
    fn test_prints_one_line_per_second() {
        let deadline = Deadline::parse("2025-05-31T21:59:00+02:00").unwrap();
        let countdown = Countdown::new(deadline, PastDeadline::Clamp);
        let mut clock = FakeClock::new(deadline.to_utc() - chrono::Duration::seconds(90_062));
        let mut out = Vec::new();

        let printed = run_with_clock(&countdown, Some(3), &mut out, &mut clock).unwrap();
        assert_eq!(printed, 3);
        assert_eq!(clock.sleeps, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["1d 1h 1m 2s", "1d 1h 1m 1s", "1d 1h 1m 0s"]);
    }

    #[test]
    fn test_zero_ticks_prints_nothing() {
        let deadline = Deadline::parse("2025-05-31T21:59:00+02:00").unwrap();
        let countdown = Countdown::new(deadline, PastDeadline::Clamp);
        let mut clock = FakeClock::new(deadline.to_utc());
        let mut out = Vec::new();

        assert_eq!(run_with_clock(&countdown, Some(0), &mut out, &mut clock).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_past_deadline_prints_zero_when_clamped() {
        let deadline = Deadline::parse("2025-05-31T21:59:00+02:00").unwrap();
        let countdown = Countdown::new(deadline, PastDeadline::Clamp);
        let mut clock = FakeClock::new(deadline.to_utc() + chrono::Duration::seconds(5));
        let mut out = Vec::new();

        run_with_clock(&countdown, Some(2), &mut out, &mut clock).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0d 0h 0m 0s\n0d 0h 0m 0s\n");
    }
}
