use chrono::{DateTime, Utc};
use std::fmt;

/// Source of "now", injectable for tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Time left until an episode starts, clamped at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    remaining_ms: i64,
}

impl Countdown {
    pub const ZERO: Countdown = Countdown { remaining_ms: 0 };

    pub fn remaining(target: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining_ms = (target - now).num_milliseconds().max(0);
        Self { remaining_ms }
    }

    pub fn remaining_secs(&self) -> i64 {
        self.remaining_ms / 1000
    }

    /// Deadline reached; callers treat the episode phase as locked.
    pub fn is_passed(&self) -> bool {
        self.remaining_ms == 0
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.remaining_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        let s = secs % 60;
        write!(f, "{h:02}:{m:02}:{s:02}")
    }
}

#[cfg(test)]
pub(crate) struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, h, m, s).unwrap()
    }

    #[test]
    fn formats_zero_padded() {
        let c = Countdown::remaining(at(21, 0, 0), at(18, 54, 3));
        assert_eq!(c.to_string(), "02:05:57");
        assert!(!c.is_passed());
    }

    #[test]
    fn sub_second_remainder_rounds_down() {
        let c = Countdown::remaining(at(12, 0, 1), at(12, 0, 0) + Duration::milliseconds(1));
        assert_eq!(c.to_string(), "00:00:00");
        assert!(!c.is_passed());
    }

    #[test]
    fn clamps_at_and_after_target() {
        assert_eq!(Countdown::remaining(at(12, 0, 0), at(12, 0, 0)), Countdown::ZERO);
        let late = Countdown::remaining(at(12, 0, 0), at(13, 30, 0));
        assert_eq!(late.remaining_secs(), 0);
        assert_eq!(late.to_string(), "00:00:00");
        assert!(late.is_passed());
    }

    #[test]
    fn hours_are_not_wrapped_at_a_day() {
        let now = at(0, 0, 0);
        let c = Countdown::remaining(now + Duration::hours(30), now);
        assert_eq!(c.to_string(), "30:00:00");
    }

    #[test]
    fn fixed_clock_feeds_the_derivation() {
        let clock = FixedClock(at(20, 59, 59));
        assert_eq!(Countdown::remaining(at(21, 0, 0), clock.now()).to_string(), "00:00:01");
    }
}
