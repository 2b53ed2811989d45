//! PeriodicTimer is a periodic-callback timer over the one-shot waits of an
//! asynchronous reactor, supported by the runtimes provided by smol and
//! tokio, which makes it easy to run an application callback on a cadence
//! until the callback or a canceller says stop.

use crate::prelude::*;
use crate::timer::clock::{Clock, SteadyClock};
use crate::timer::one_shot::{OneShotWait, ReactorOneShot, TimerSignal};
use crate::timer::timer_core::SchedulePolicy;

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use tokio::runtime::{Builder as TokioBuilder, Handle, Runtime};

/// The reactor binding a timer arms its waits on.
#[derive(Clone, Debug)]
pub enum ReactorKind {
    /// The global `smol` reactor.
    Smol,

    /// A `tokio` runtime, reached through its handle.
    Tokio(Handle),
}

/// The reactor a timer was built over, plus the guard that keeps a
/// self-built or handed-over tokio runtime alive for as long as the timer.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReactorInstance {
    // smol has no instance to hold on to.
    pub(crate) inner: Option<Arc<Runtime>>,
    // Some = tokio, None = smol.
    pub(crate) handle: Option<Handle>,
}

impl ReactorInstance {
    pub(crate) fn kind(&self) -> ReactorKind {
        match &self.handle {
            Some(handle) => ReactorKind::Tokio(handle.clone()),
            None => ReactorKind::Smol,
        }
    }

    pub(crate) fn tokio_support() -> Option<Runtime> {
        TokioBuilder::new_multi_thread()
            .enable_all()
            .thread_name_fn(|| {
                static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
                let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
                format!("periodic-timer-{}", id)
            })
            .on_thread_start(|| {
                info!("tokio-thread started");
            })
            .build()
            .ok()
    }
}

/// Builds PeriodicTimer with custom configuration values.
///
/// Methods can be chained in order to set the configuration values. The
/// PeriodicTimer is constructed by calling `build` (or `build_with_clock`
/// for a clock other than the steady one).
#[derive(Debug, Default)]
pub struct PeriodicTimerBuilder {
    /// ReactorInstance (Smol | Tokio)
    pub(crate) reactor_instance: ReactorInstance,
}

impl PeriodicTimerBuilder {
    /// With this API, `PeriodicTimer` arms its waits on the global
    /// `smol` reactor.
    ///
    /// This is the default, so the call is only needed to undo an earlier
    /// tokio binding on the same builder.
    pub fn smol_reactor_by_default(mut self) -> Self {
        self.reactor_instance = ReactorInstance::default();
        self
    }

    /// With this API, `PeriodicTimer` builds its own multi-thread
    /// `TokioRuntime` internally and keeps it alive for as long as the
    /// timer.
    pub fn tokio_reactor_by_default(mut self) -> Self {
        let rt = ReactorInstance::tokio_support().expect("init tokio-Runtime is fail.");
        self.reactor_instance.handle = Some(rt.handle().clone());
        self.reactor_instance.inner = Some(Arc::new(rt));
        self
    }

    /// With this API, `PeriodicTimer` takes over the user customized and
    /// independent `TokioRuntime`.
    pub fn tokio_reactor_by_custom(mut self, rt: Runtime) -> Self {
        self.reactor_instance.handle = Some(rt.handle().clone());
        self.reactor_instance.inner = Some(Arc::new(rt));
        self
    }

    /// With this API, `PeriodicTimer` will share a `TokioRuntime` with the
    /// user.
    pub fn tokio_reactor_shared_by_custom(mut self, rt: Arc<Runtime>) -> Self {
        self.reactor_instance.handle = Some(rt.handle().clone());
        self.reactor_instance.inner = Some(rt);
        self
    }

    /// With this API, `PeriodicTimer` arms its waits through a runtime
    /// handle the caller keeps alive. No guard is held: the caller must
    /// not shut the runtime down under outstanding waits.
    pub fn tokio_reactor_by_handle(mut self, handle: Handle) -> Self {
        self.reactor_instance.handle = Some(handle);
        self.reactor_instance.inner = None;
        self
    }

    /// Build a PeriodicTimer over the steady clock.
    pub fn build(self) -> PeriodicTimer {
        self.build_with_clock::<SteadyClock>()
    }

    /// Build a PeriodicTimer over the given clock source.
    pub fn build_with_clock<C: Clock>(self) -> PeriodicTimer<C> {
        PeriodicTimer {
            context: Arc::new(ScheduleContext::new()),
            reactor: self.reactor_instance,
            clock: PhantomData,
        }
    }
}

/// An asynchronous periodic timer: one instance, one schedule.
///
/// A timer is created unscheduled; any of the `start_*` calls arms it. The
/// installed callback is then invoked on the reactor's executor threads,
/// once per interval, until it returns `false`, the schedule is cancelled,
/// or the timer is dropped. A settled timer holds nothing armed on the
/// reactor and may be re-started any number of times.
///
/// The type is deliberately not `Clone`: two handles over one underlying
/// schedule would race on the single wait. Dropping a timer (including
/// dropping the old value on re-assignment) requests cancellation, and the
/// in-flight callback sees one final `Cancelled` signal; an explicitly
/// moved handle keeps driving its schedule unchanged. The driver task owns
/// the callback and a reference to the shared schedule context, never the
/// handle, so no lifetime obligation is left with the caller.
///
/// Needs many timers, possibly sorted by deadline? Build the container out
/// of `PeriodicTimer` values; this type stays a single element.
pub struct PeriodicTimer<C: Clock = SteadyClock> {
    context: Arc<ScheduleContext>,
    reactor: ReactorInstance,
    clock: PhantomData<C>,
}

impl Default for PeriodicTimer {
    fn default() -> Self {
        PeriodicTimerBuilder::default().build()
    }
}

impl PeriodicTimer {
    /// New a PeriodicTimer over the smol reactor and the steady clock.
    pub fn new() -> PeriodicTimer {
        PeriodicTimerBuilder::default().build()
    }
}

impl<C: Clock> PeriodicTimer<C> {
    /// Start the timer; the callback fires first at `now() + interval`,
    /// then again one interval after each completion.
    ///
    /// The callback keeps being invoked for as long as it returns `true`.
    /// The reported elapsed time is measured from the previous actual
    /// completion, so the first report is approximately `interval`.
    pub fn start_duration_timer<F>(&self, interval: Duration, callback: F) -> Result<(), TimerError>
    where
        F: FnMut(TimerSignal, Duration) -> bool + Send + 'static,
    {
        let first_fire = C::advance(C::now(), interval);
        self.start_duration_timer_at(interval, first_fire, callback)
    }

    /// Start the timer with an explicit first fire instant; subsequent
    /// fires follow one interval after each completion.
    ///
    /// A `first_fire` already reached fires immediately. The first reported
    /// elapsed time is the true wait from this call to the first fire.
    pub fn start_duration_timer_at<F>(
        &self,
        interval: Duration,
        first_fire: C::TimePoint,
        callback: F,
    ) -> Result<(), TimerError>
    where
        F: FnMut(TimerSignal, Duration) -> bool + Send + 'static,
    {
        self.start_with_one_shot(
            SchedulePolicy::DurationRelative,
            interval,
            first_fire,
            self.reactor_one_shot(),
            callback,
        )
    }

    /// Start the timer on the ideal grid anchored at `now() + interval`:
    /// fire instants stay locked to the grid regardless of how long each
    /// callback takes.
    pub fn start_timepoint_timer<F>(
        &self,
        interval: Duration,
        callback: F,
    ) -> Result<(), TimerError>
    where
        F: FnMut(TimerSignal, Duration) -> bool + Send + 'static,
    {
        let first_fire = C::advance(C::now(), interval);
        self.start_timepoint_timer_at(interval, first_fire, callback)
    }

    /// Start the timer on the ideal grid anchored at an explicit first
    /// fire instant.
    ///
    /// The elapsed time reported on the first invocation is synthesized as
    /// approximately `interval` rather than the true wait to `first_fire`,
    /// since there is no previous fire to measure from.
    pub fn start_timepoint_timer_at<F>(
        &self,
        interval: Duration,
        first_fire: C::TimePoint,
        callback: F,
    ) -> Result<(), TimerError>
    where
        F: FnMut(TimerSignal, Duration) -> bool + Send + 'static,
    {
        self.start_with_one_shot(
            SchedulePolicy::TimepointRelative,
            interval,
            first_fire,
            self.reactor_one_shot(),
            callback,
        )
    }

    /// Start a schedule over a caller-supplied one-shot wait instead of
    /// the timer's own reactor binding.
    ///
    /// This is the seam all the named `start_*` operations go through;
    /// custom implementations slot in alternative reactors or scripted
    /// waits for tests. Starting while a schedule is armed supersedes it:
    /// the old callback sees one final `Cancelled` signal.
    pub fn start_with_one_shot<W, F>(
        &self,
        policy: SchedulePolicy,
        interval: Duration,
        first_fire: C::TimePoint,
        one_shot: W,
        callback: F,
    ) -> Result<(), TimerError>
    where
        W: OneShotWait<C> + 'static,
        F: FnMut(TimerSignal, Duration) -> bool + Send + 'static,
    {
        if interval == Duration::default() {
            return Err(TimerError::ZeroInterval);
        }

        let anchor = match policy {
            SchedulePolicy::DurationRelative => C::now(),
            SchedulePolicy::TimepointRelative => C::rewind(first_fire, interval),
        };
        let schedule = Schedule {
            policy,
            interval,
            anchor,
        };

        let epoch = self.context.begin();
        let driver = drive(
            self.context.clone(),
            epoch,
            schedule,
            first_fire,
            one_shot,
            callback,
        )
        .instrument(info_span!("periodic_schedule", epoch));

        match &self.reactor.handle {
            Some(handle) => {
                handle.spawn(driver);
            }
            None => async_spawn_by_smol(driver).detach(),
        }

        Ok(())
    }

    /// Request cancellation of the outstanding schedule, if any.
    ///
    /// Asynchronous: the callback is invoked once more, later and on the
    /// reactor, with the `Cancelled` signal and the elapsed time measured
    /// to the cancellation instant. A `true` return from that invocation
    /// does not re-arm.
    pub fn cancel(&self) {
        self.context.request_cancel();
    }

    /// Current schedule state, one of the [`state`] constants.
    ///
    /// [`state`]: crate::timer::timer_core::state
    pub fn state(&self) -> usize {
        self.context.state()
    }

    /// Whether a schedule is currently armed on the reactor.
    pub fn is_armed(&self) -> bool {
        self.context.is_armed()
    }

    /// A detached, clonable handle that can cancel this timer's schedule
    /// from anywhere, without owning the timer.
    pub fn canceller(&self) -> TimerCanceller {
        TimerCanceller {
            context: Arc::downgrade(&self.context),
        }
    }

    fn reactor_one_shot(&self) -> ReactorOneShot {
        ReactorOneShot::new(self.reactor.kind())
    }
}

impl<C: Clock> fmt::Debug for PeriodicTimer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTimer")
            .field("armed", &self.is_armed())
            .field("reactor", &self.reactor)
            .finish()
    }
}

impl<C: Clock> Drop for PeriodicTimer<C> {
    fn drop(&mut self) {
        // The schedule must not outlive its handle; the in-flight callback
        // sees one final `Cancelled` signal on the reactor.
        self.context.request_cancel();
    }
}

/// A detached cancel handle to a [`PeriodicTimer`].
///
/// Holds only a weak reference: it never keeps the timer alive, and
/// cancelling after the timer is gone reports [`TimerError::Expired`].
#[derive(Clone, Debug)]
pub struct TimerCanceller {
    context: Weak<ScheduleContext>,
}

impl TimerCanceller {
    /// Request cancellation of the timer's outstanding schedule, if any.
    pub fn cancel(&self) -> Result<(), TimerError> {
        let context = self.context.upgrade().ok_or(TimerError::Expired)?;
        context.request_cancel();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_the_smol_reactor() {
        let builder = PeriodicTimerBuilder::default();

        assert!(builder.reactor_instance.handle.is_none());
        assert!(builder.reactor_instance.inner.is_none());
        assert!(matches!(builder.reactor_instance.kind(), ReactorKind::Smol));
    }

    #[test]
    fn handle_binding_keeps_no_runtime_guard() {
        let rt = ReactorInstance::tokio_support().unwrap();
        let builder = PeriodicTimerBuilder::default().tokio_reactor_by_handle(rt.handle().clone());

        assert!(builder.reactor_instance.inner.is_none());
        assert!(matches!(
            builder.reactor_instance.kind(),
            ReactorKind::Tokio(_)
        ));
    }

    #[test]
    fn custom_runtime_is_kept_alive_by_the_timer() {
        let rt = ReactorInstance::tokio_support().unwrap();
        let timer = PeriodicTimerBuilder::default()
            .tokio_reactor_by_custom(rt)
            .build();

        assert!(timer.reactor.inner.is_some());
        assert!(!timer.is_armed());
    }

    #[test]
    fn fresh_timer_is_idle_and_cancel_is_harmless() {
        let timer = PeriodicTimer::new();

        assert!(!timer.is_armed());
        timer.cancel();
        assert!(!timer.is_armed());
    }

    #[test]
    fn canceller_expires_with_its_timer() {
        let timer = PeriodicTimer::new();
        let canceller = timer.canceller();

        assert_eq!(canceller.cancel(), Ok(()));

        drop(timer);
        assert_eq!(canceller.cancel(), Err(TimerError::Expired));
    }
}
