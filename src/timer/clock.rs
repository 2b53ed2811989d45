//! Clock sources a periodic schedule can run against.

use std::fmt::Debug;
use std::time::{Duration, Instant, SystemTime};

/// A source of time points that deadlines are computed against.
///
/// The scheduler is generic over this trait so the same schedule logic runs
/// on a monotonic clock or on the wall clock. Readings are opaque instants;
/// all arithmetic goes through the associated functions here.
///
/// Wall clocks may be stepped backwards by the operating system. `since` and
/// `until` report zero in that case instead of failing, and `rewind` clamps
/// to its input when the result is not representable.
pub trait Clock: Send + Sync + 'static {
    /// Absolute reading of this clock.
    type TimePoint: Copy + Debug + Send + Sync + 'static;

    /// Current reading.
    fn now() -> Self::TimePoint;

    /// The reading `dur` after `tp`.
    fn advance(tp: Self::TimePoint, dur: Duration) -> Self::TimePoint;

    /// The reading `dur` before `tp`, clamped to `tp` when out of range.
    fn rewind(tp: Self::TimePoint, dur: Duration) -> Self::TimePoint;

    /// Time passed from `earlier` to `later`, zero if the clock went
    /// backwards in between.
    fn since(later: Self::TimePoint, earlier: Self::TimePoint) -> Duration;

    /// Remaining wait from now until `tp`, zero for readings already
    /// reached.
    ///
    /// This is what a deadline is converted through when a wait is armed;
    /// the conversion happens once per arm, so a wall clock stepped while
    /// the wait is in flight does not re-anchor it.
    fn until(tp: Self::TimePoint) -> Duration {
        Self::since(tp, Self::now())
    }
}

/// Monotonic clock, `std::time::Instant`. Readings never move backwards and
/// are unaffected by system time adjustment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteadyClock;

impl Clock for SteadyClock {
    type TimePoint = Instant;

    fn now() -> Instant {
        Instant::now()
    }

    fn advance(tp: Instant, dur: Duration) -> Instant {
        tp + dur
    }

    fn rewind(tp: Instant, dur: Duration) -> Instant {
        tp.checked_sub(dur).unwrap_or(tp)
    }

    fn since(later: Instant, earlier: Instant) -> Duration {
        later.saturating_duration_since(earlier)
    }
}

/// Wall clock, `std::time::SystemTime`. Readings follow the operating
/// system time, which may be stepped in either direction at any moment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type TimePoint = SystemTime;

    fn now() -> SystemTime {
        SystemTime::now()
    }

    fn advance(tp: SystemTime, dur: Duration) -> SystemTime {
        tp + dur
    }

    fn rewind(tp: SystemTime, dur: Duration) -> SystemTime {
        tp.checked_sub(dur).unwrap_or(tp)
    }

    fn since(later: SystemTime, earlier: SystemTime) -> Duration {
        later.duration_since(earlier).unwrap_or_default()
    }
}

/// Finest-grained clock available. On every platform std supports this is
/// the steady clock, so it is an alias rather than a third implementation.
pub type HighResolutionClock = SteadyClock;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_clock_arithmetic_round_trips() {
        let base = SteadyClock::now();
        let step = Duration::from_millis(250);

        let later = SteadyClock::advance(base, step);
        assert_eq!(SteadyClock::since(later, base), step);
        assert_eq!(SteadyClock::rewind(later, step), base);
    }

    #[test]
    fn steady_clock_since_saturates_backwards() {
        let base = SteadyClock::now();
        let later = SteadyClock::advance(base, Duration::from_secs(5));

        assert_eq!(SteadyClock::since(base, later), Duration::default());
    }

    #[test]
    fn system_clock_since_saturates_backwards() {
        let base = SystemClock::now();
        let later = SystemClock::advance(base, Duration::from_secs(5));

        assert_eq!(SystemClock::since(base, later), Duration::default());
        assert_eq!(SystemClock::since(later, base), Duration::from_secs(5));
    }

    #[test]
    fn until_reports_zero_for_reached_deadlines() {
        let past = SteadyClock::rewind(SteadyClock::now(), Duration::from_secs(1));
        assert_eq!(SteadyClock::until(past), Duration::default());

        let past = SystemClock::rewind(SystemClock::now(), Duration::from_secs(1));
        assert_eq!(SystemClock::until(past), Duration::default());
    }

    #[test]
    fn until_tracks_future_deadlines() {
        let ahead = SteadyClock::advance(SteadyClock::now(), Duration::from_secs(60));
        let remaining = SteadyClock::until(ahead);

        assert!(remaining > Duration::from_secs(59));
        assert!(remaining <= Duration::from_secs(60));
    }
}
