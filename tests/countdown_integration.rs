// Countdown arithmetic and the one-second update timer, end to end

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use torus_countdown::countdown::seconds_until;
use torus_countdown::{AppConfig, Countdown, Deadline, IntervalTimer, PastDeadline, Remaining};
use web_time::Instant;

fn default_countdown(policy: PastDeadline) -> Countdown {
    let config = AppConfig {
        past_deadline: policy,
        ..AppConfig::default()
    };
    config.countdown().unwrap()
}

#[test]
fn test_fields_reconstruct_total_before_deadline() {
    let countdown = default_countdown(PastDeadline::Clamp);
    let deadline = countdown.deadline.to_utc();

    for total in [0i64, 1, 59, 60, 3_599, 3_600, 86_399, 86_400, 90_061, 31_536_000] {
        let remaining = countdown.remaining_at(deadline - ChronoDuration::seconds(total));
        assert_eq!(remaining.total_seconds(), total);
        assert_eq!(remaining.magnitude_seconds(), total as u64);
        assert!(!remaining.negative);
        assert!(remaining.hours < 24 && remaining.minutes < 60 && remaining.seconds < 60);
    }
}

#[test]
fn test_zero_exactly_at_deadline() {
    for policy in [PastDeadline::Clamp, PastDeadline::Negative] {
        let countdown = default_countdown(policy);
        let remaining = countdown.remaining_at(countdown.deadline.to_utc());
        assert!(remaining.is_zero());
        assert_eq!(remaining.label(), "0d 0h 0m 0s");
    }
}

#[test]
fn test_one_second_after_deadline() {
    let clamp = default_countdown(PastDeadline::Clamp);
    let after = clamp.deadline.to_utc() + ChronoDuration::seconds(1);
    assert_eq!(clamp.remaining_at(after).total_seconds(), 0);

    let negative = default_countdown(PastDeadline::Negative);
    let remaining = negative.remaining_at(after);
    assert_eq!(remaining.total_seconds(), -1);
    assert!(remaining.negative);
    assert_eq!(
        (remaining.days, remaining.hours, remaining.minutes, remaining.seconds),
        (0, 0, 0, 1)
    );
    assert_eq!(-(remaining.magnitude_seconds() as i64), remaining.total_seconds());
}

#[test]
fn test_negative_decomposition_keeps_sign_identity() {
    for total in [-1i64, -61, -3_601, -90_061] {
        let remaining = Remaining::from_total_seconds(total);
        assert!(remaining.negative);
        assert_eq!(-(remaining.magnitude_seconds() as i64), total);
        assert!(remaining.label().starts_with('-'));
    }
}

#[test]
fn test_sub_second_offsets_truncate_toward_zero() {
    let deadline = Deadline::parse("2030-06-01T12:00:00Z").unwrap();
    let now = deadline.to_utc() - ChronoDuration::milliseconds(1_999);
    assert_eq!(seconds_until(&deadline, now), 1);

    let late = deadline.to_utc() + ChronoDuration::milliseconds(900);
    assert_eq!(seconds_until(&deadline, late), 0);
}

#[test]
fn test_live_countdown_is_not_negative_when_clamped() {
    let countdown = Countdown::new(
        Deadline::parse("2000-01-01T00:00:00Z").unwrap(),
        PastDeadline::Clamp,
    );
    assert!(countdown.remaining_at(Utc::now()).is_zero());
}

#[test]
fn test_updates_are_never_early() {
    let start = Instant::now();
    let mut timer = IntervalTimer::every_second(start);

    for n in 1..=5u64 {
        let just_before = start + Duration::from_millis(n * 1000 - 1);
        assert_eq!(timer.poll(just_before), None);

        let at = start + Duration::from_secs(n);
        assert_eq!(timer.poll(at), Some(n));
        assert!(timer.next_deadline().unwrap() >= start + Duration::from_secs(n + 1));
    }
}

#[test]
fn test_no_updates_after_cancel() {
    let start = Instant::now();
    let mut timer = IntervalTimer::every_second(start);
    assert_eq!(timer.poll(start + Duration::from_secs(1)), Some(1));

    timer.cancel();
    assert_eq!(timer.poll(start + Duration::from_secs(10)), None);
    assert_eq!(timer.next_deadline(), None);
    assert_eq!(timer.fired(), 1);
}
