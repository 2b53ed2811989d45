//! PeriodicTimer is an asynchronous periodic timer that wraps and
//! simplifies the one-shot waits of an async reactor when periodic
//! callbacks are needed. The reactors it binds to (the global `smol`
//! reactor or a `tokio` runtime) only fire a wait once; application code
//! wanting periodicity must chain completion upon completion until
//! satisfied. `PeriodicTimer` supplies the chaining, with two options for
//! the periodicity, and computes elapsed times for the application
//! supplied callback.
//!
//! # Quick start
//!
//! ```
//! use periodic_timer::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> AnyResult<()> {
//! let timer = PeriodicTimer::new();
//!
//! let mut remaining = 3;
//! timer.start_duration_timer(Duration::from_millis(50), move |signal, elapsed| {
//!     println!("{:?} after {:?}", signal, elapsed);
//!     remaining -= 1;
//!     remaining > 0
//! })?;
//!
//! std::thread::sleep(Duration::from_millis(400));
//! assert!(!timer.is_armed());
//! # Ok(()) }
//! ```
//!
//! # Duration-based or timepoint-based periodicity
//!
//! The first option, [`start_duration_timer`], invokes the callback one
//! interval after the previous completion. It is simple and consistent,
//! specially if the system clock is allowed to be adjusted.
//!
//! The second option, [`start_timepoint_timer`], invokes the callback on
//! fixed timepoints. This fits environments where work must run on regular
//! instants regardless of how much processing each callback performs. For
//! example, with a 500 millisecond interval, a callback taking 15
//! milliseconds and an operating environment that occasionally adds 10 or
//! 20 more, the duration-based timer drifts to 515-535 milliseconds between
//! invocations, while the timepoint-based timer keeps firing every 500
//! milliseconds. The cost is exposure to system clock adjustment when run
//! on the wall clock, and "overflow": if a callback overruns a full
//! interval, the overrun timepoints fire immediately, back-to-back.
//!
//! A timer stops when the callback returns `false` rather than `true`, when
//! [`cancel`] is called (the callback then sees one final
//! [`TimerSignal::Cancelled`] with the elapsed time to the cancellation
//! instant), or when the timer is dropped. A stopped timer can be started
//! again. Returning `false` unconditionally from the first invocation makes
//! it a one-shot timer.
//!
//! # Clocks and reactors
//!
//! The timer is generic over a [`Clock`]: the monotonic [`SteadyClock`]
//! (default), the adjustable wall-clock [`SystemClock`], or
//! [`HighResolutionClock`]. The reactor is chosen through
//! [`PeriodicTimerBuilder`]; the waits themselves go through the
//! [`OneShotWait`] trait, so alternative reactors can be plugged in via
//! [`start_with_one_shot`].
//!
//! One `PeriodicTimer` models exactly one timer. Designs needing many
//! periodic timers, possibly sorted by time, should build their own
//! containers with `PeriodicTimer` as the element.
//!
//! [`start_duration_timer`]: entity::PeriodicTimer::start_duration_timer
//! [`start_timepoint_timer`]: entity::PeriodicTimer::start_timepoint_timer
//! [`start_with_one_shot`]: entity::PeriodicTimer::start_with_one_shot
//! [`cancel`]: entity::PeriodicTimer::cancel
//! [`PeriodicTimerBuilder`]: entity::PeriodicTimerBuilder
//! [`Clock`]: timer::clock::Clock
//! [`SteadyClock`]: timer::clock::SteadyClock
//! [`SystemClock`]: timer::clock::SystemClock
//! [`HighResolutionClock`]: timer::clock::HighResolutionClock
//! [`OneShotWait`]: timer::one_shot::OneShotWait
//! [`TimerSignal::Cancelled`]: timer::one_shot::TimerSignal

pub mod entity;
pub mod error;
pub mod prelude;
pub mod timer;
