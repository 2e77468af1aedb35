//! Countdown Module
//!
//! Pure functions from (deadline, now) to the remaining time. Nothing here
//! holds state between ticks: every refresh recomputes a fresh `Remaining`
//! from the wall clock.

pub mod ticker;

pub use ticker::IntervalTimer;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::countdown::*;
use crate::error::{AppError, AppResult};

/// Fixed instant the countdown runs towards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(DateTime<FixedOffset>);

impl Deadline {
    /// Parse an RFC 3339 timestamp such as `2025-05-31T21:59:00+02:00`
    pub fn parse(input: &str) -> AppResult<Self> {
        DateTime::parse_from_rfc3339(input.trim())
            .map(Deadline)
            .map_err(|e| AppError::InvalidDeadline {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.with_timezone(&Utc)
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// What the countdown shows once the deadline has passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "native", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum PastDeadline {
    /// Stop at zero
    #[default]
    Clamp,
    /// Keep counting into negative time
    Negative,
}

/// Signed whole seconds from `now` until `deadline`.
///
/// Fractional seconds are truncated toward zero, so 0.9s before the
/// deadline reads 0 and 0.9s after reads 0 as well.
pub fn seconds_until(deadline: &Deadline, now: DateTime<Utc>) -> i64 {
    (deadline.to_utc() - now).num_seconds()
}

/// Remaining time decomposed into days, hours, minutes and seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remaining {
    total_seconds: i64,
    pub negative: bool,
    pub days: u64,
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

impl Remaining {
    /// Decompose a signed second count.
    ///
    /// Negative totals are decomposed by magnitude and flagged, so the
    /// fields always satisfy `sign * (d*86400 + h*3600 + m*60 + s) == total`.
    pub fn from_total_seconds(total_seconds: i64) -> Self {
        let magnitude = total_seconds.unsigned_abs();
        let day = SECONDS_PER_DAY as u64;
        let hour = SECONDS_PER_HOUR as u64;
        let minute = SECONDS_PER_MINUTE as u64;

        Self {
            total_seconds,
            negative: total_seconds < 0,
            days: magnitude / day,
            hours: ((magnitude % day) / hour) as u8,
            minutes: ((magnitude % hour) / minute) as u8,
            seconds: (magnitude % minute) as u8,
        }
    }

    /// Remaining time at `now`, with the past-deadline policy applied
    pub fn between(deadline: &Deadline, now: DateTime<Utc>, policy: PastDeadline) -> Self {
        let raw = seconds_until(deadline, now);
        let total = match policy {
            PastDeadline::Clamp => raw.max(0),
            PastDeadline::Negative => raw,
        };
        Self::from_total_seconds(total)
    }

    pub fn total_seconds(&self) -> i64 {
        self.total_seconds
    }

    /// `d*86400 + h*3600 + m*60 + s`, without the sign
    pub fn magnitude_seconds(&self) -> u64 {
        self.days * SECONDS_PER_DAY as u64
            + u64::from(self.hours) * SECONDS_PER_HOUR as u64
            + u64::from(self.minutes) * SECONDS_PER_MINUTE as u64
            + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds == 0
    }

    /// The countdown line, e.g. `3d 4h 5m 6s`
    pub fn label(&self) -> String {
        let sign = if self.negative { "-" } else { "" };
        format!(
            "{}{}d {}h {}m {}s",
            sign, self.days, self.hours, self.minutes, self.seconds
        )
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A deadline paired with its past-deadline policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub deadline: Deadline,
    pub policy: PastDeadline,
}

impl Countdown {
    pub fn new(deadline: Deadline, policy: PastDeadline) -> Self {
        Self { deadline, policy }
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> Remaining {
        Remaining::between(&self.deadline, now, self.policy)
    }

    /// Remaining time against the system clock
    pub fn remaining_now(&self) -> Remaining {
        self.remaining_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn deadline() -> Deadline {
        Deadline::parse("2025-05-31T21:59:00+02:00").unwrap()
    }

    #[test]
    fn test_default_deadline_matches_constant() {
        let d = Deadline::parse(DEFAULT_DEADLINE).unwrap();
        assert_eq!(d, deadline());
        assert_eq!(
            d.to_utc(),
            Utc.with_ymd_and_hms(2025, 5, 31, 19, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Deadline::parse("next friday").unwrap_err();
        assert!(matches!(err, AppError::InvalidDeadline { .. }));
    }

    #[test]
    fn test_future_decomposition_reconstructs_total() {
        let d = deadline();
        let offsets = [1, 59, 60, 61, 3599, 3600, 86_399, 86_400, 90_061, 31_536_000 + 12_345];
        for offset in offsets {
            let now = d.to_utc() - Duration::seconds(offset);
            let r = Remaining::between(&d, now, PastDeadline::Clamp);
            assert_eq!(r.total_seconds(), offset);
            assert_eq!(r.magnitude_seconds() as i64, r.total_seconds());
            assert!(r.hours < 24 && r.minutes < 60 && r.seconds < 60);
        }
    }

    #[test]
    fn test_example_decomposition() {
        let r = Remaining::from_total_seconds(90_061);
        assert_eq!((r.days, r.hours, r.minutes, r.seconds), (1, 1, 1, 1));
        assert_eq!(r.label(), "1d 1h 1m 1s");
    }

    #[test]
    fn test_exact_deadline_is_zero() {
        let d = deadline();
        for policy in [PastDeadline::Clamp, PastDeadline::Negative] {
            let r = Remaining::between(&d, d.to_utc(), policy);
            assert!(r.is_zero());
            assert!(!r.negative);
            assert_eq!((r.days, r.hours, r.minutes, r.seconds), (0, 0, 0, 0));
            assert_eq!(r.label(), "0d 0h 0m 0s");
        }
    }

    #[test]
    fn test_one_second_after_deadline() {
        let d = deadline();
        let now = d.to_utc() + Duration::seconds(1);

        let clamped = Remaining::between(&d, now, PastDeadline::Clamp);
        assert!(clamped.is_zero());
        assert_eq!(clamped.label(), "0d 0h 0m 0s");

        let negative = Remaining::between(&d, now, PastDeadline::Negative);
        assert_eq!(negative.total_seconds(), -1);
        assert!(negative.negative);
        assert_eq!((negative.days, negative.hours, negative.minutes, negative.seconds), (0, 0, 0, 1));
        assert_eq!(negative.label(), "-0d 0h 0m 1s");
    }

    #[test]
    fn test_negative_reconstruction_holds() {
        for total in [-1_i64, -61, -3_601, -90_061, -1_000_000] {
            let r = Remaining::from_total_seconds(total);
            assert_eq!(-(r.magnitude_seconds() as i64), total);
        }
    }

    #[test]
    fn test_fractional_seconds_truncate_toward_zero() {
        let d = deadline();
        let before = d.to_utc() - Duration::milliseconds(1_900);
        assert_eq!(seconds_until(&d, before), 1);

        let after = d.to_utc() + Duration::milliseconds(900);
        assert_eq!(seconds_until(&d, after), 0);
    }
}
