//! The re-arming heart of the crate.
//!
//! Every armed schedule is driven by one spawned task that loops over a
//! single one-shot wait: wait, invoke the application callback with the
//! completion signal and the elapsed time, then compute the next fire
//! instant according to the schedule policy and arm again. The next wait is
//! armed only from inside the previous completion, so a schedule never has
//! two waits outstanding.
//!
//! Cancellation and restarts reach a running driver through the shared
//! [`ScheduleContext`]: the driver races its wait against the cancel event
//! and re-checks the epoch watermarks on every wake.

use crate::prelude::*;
use crate::timer::clock::Clock;
use crate::timer::one_shot::{OneShotWait, TimerSignal};

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::{AcqRel, Acquire, Release};
use std::sync::Arc;

use event_listener::Event;
use futures::future::{select, Either};
use futures::pin_mut;

/// Observable schedule states.
pub mod state {
    /// Set if no schedule is armed.
    pub const IDLE: usize = 1 << 1;

    /// Set if a schedule is armed and its driver is live.
    pub const ARMED: usize = 1 << 2;
}

/// How the next fire instant and the reported elapsed time are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    /// Next fire = actual previous completion instant + interval.
    ///
    /// Drift-tolerant: delay in one period never compounds into the next,
    /// but each period individually runs long by however much the previous
    /// callback or the reactor was delayed.
    DurationRelative,
    /// Next fire stays on the ideal grid anchored at the first fire.
    ///
    /// Drift-correcting: fire instants stay locked to `anchor`,
    /// `anchor + interval`, `anchor + 2·interval`, … regardless of
    /// per-cycle processing delay. A callback overrunning a full interval
    /// leaves later instants in the past, which fire immediately
    /// back-to-back ("overflow"); that is accepted, not corrected.
    TimepointRelative,
}

/// Cross-task state shared by the timer handle, its cancellers and the
/// driver tasks it spawned.
///
/// Each `start_*` call opens a new epoch; a driver belongs to the epoch it
/// was spawned under. A driver whose epoch is behind the current one, or at
/// or below the cancel watermark, is revoked and must settle with a
/// `Cancelled` callback. A superseded driver can never settle the state of
/// its successor, because settling is gated on the epoch still matching.
#[derive(Debug)]
pub(crate) struct ScheduleContext {
    state: AtomicUsize,
    epoch: AtomicUsize,
    cancel_watermark: AtomicUsize,
    cancel_event: Event,
}

impl ScheduleContext {
    pub(crate) fn new() -> Self {
        ScheduleContext {
            state: AtomicUsize::new(state::IDLE),
            epoch: AtomicUsize::new(0),
            cancel_watermark: AtomicUsize::new(0),
            cancel_event: Event::new(),
        }
    }

    /// Open a new epoch for a fresh schedule and return it.
    ///
    /// Kicks any superseded driver off its wait so it can deliver its
    /// terminal callback promptly.
    pub(crate) fn begin(&self) -> usize {
        let epoch = self.epoch.fetch_add(1, AcqRel) + 1;
        self.cancel_event.notify(usize::MAX);
        self.state.store(state::ARMED, Release);
        epoch
    }

    /// Request cancellation of the current schedule, if any.
    ///
    /// Only a request: the terminal `Cancelled` callback is delivered later
    /// by the driver, on the reactor.
    pub(crate) fn request_cancel(&self) {
        self.cancel_watermark
            .store(self.epoch.load(Acquire), Release);
        self.cancel_event.notify(usize::MAX);
    }

    /// Whether the schedule opened as `epoch` has been cancelled or
    /// superseded by a newer `start_*` call.
    pub(crate) fn revoked(&self, epoch: usize) -> bool {
        self.epoch.load(Acquire) != epoch || self.cancel_watermark.load(Acquire) >= epoch
    }

    /// Mark the timer idle, unless a newer schedule has taken over.
    pub(crate) fn settle(&self, epoch: usize) {
        if self.epoch.load(Acquire) == epoch {
            self.state.store(state::IDLE, Release);
        }
    }

    pub(crate) fn state(&self) -> usize {
        self.state.load(Acquire)
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.state() == state::ARMED
    }
}

/// One armed schedule: the policy, the cadence, and the anchor the next
/// elapsed report and fire instant are computed from.
#[derive(Debug)]
pub(crate) struct Schedule<C: Clock> {
    pub(crate) policy: SchedulePolicy,
    pub(crate) interval: Duration,
    /// Duration-relative: the previous actual completion instant.
    /// Timepoint-relative: the ideal previous fire instant on the grid.
    pub(crate) anchor: C::TimePoint,
}

impl<C: Clock> Schedule<C> {
    /// Elapsed time to report for a completion observed at `now`.
    fn elapsed(&self, now: C::TimePoint) -> Duration {
        C::since(now, self.anchor)
    }

    /// Deadline of the next wait; advances the anchor for the next cycle.
    fn rearm(&mut self, now: C::TimePoint) -> C::TimePoint {
        match self.policy {
            SchedulePolicy::DurationRelative => {
                self.anchor = now;
                C::advance(now, self.interval)
            }
            SchedulePolicy::TimepointRelative => {
                let next = C::advance(self.anchor, self.interval + self.interval);
                self.anchor = C::advance(self.anchor, self.interval);
                next
            }
        }
    }
}

/// Drive one schedule to completion.
///
/// Owns the one-shot wait and the callback outright; the handle is reached
/// only through the shared context, so nothing here points back at the
/// `PeriodicTimer` value and the handle may be dropped or moved freely
/// while waits are in flight.
pub(crate) async fn drive<C, W, F>(
    context: Arc<ScheduleContext>,
    epoch: usize,
    mut schedule: Schedule<C>,
    first_fire: C::TimePoint,
    mut one_shot: W,
    mut callback: F,
) where
    C: Clock,
    W: OneShotWait<C>,
    F: FnMut(TimerSignal, Duration) -> bool,
{
    debug!(
        "schedule start: epoch={} policy={:?} interval={:?}",
        epoch, schedule.policy, schedule.interval
    );
    let mut deadline = first_fire;

    loop {
        let signal = wait_or_cancel(&context, epoch, &mut one_shot, deadline).await;

        let now = C::now();
        let elapsed = schedule.elapsed(now);
        trace!(
            "schedule tick: epoch={} signal={:?} elapsed={:?}",
            epoch,
            signal,
            elapsed
        );

        let keep_going = callback(signal, elapsed);

        // A cancellation signal always terminates, even over a `true`
        // return. Any other signal leaves the callback in control.
        if signal.is_cancelled() || !keep_going {
            context.settle(epoch);
            debug!("schedule settled: epoch={} signal={:?}", epoch, signal);
            return;
        }

        deadline = schedule.rearm(now);
    }
}

/// Wait out `deadline`, or resolve `Cancelled` as soon as this epoch is
/// revoked. Polls the wait first, so an elapsed deadline beats a
/// simultaneous revocation.
async fn wait_or_cancel<C, W>(
    context: &ScheduleContext,
    epoch: usize,
    one_shot: &mut W,
    deadline: C::TimePoint,
) -> TimerSignal
where
    C: Clock,
    W: OneShotWait<C>,
{
    loop {
        let listener = context.cancel_event.listen();
        // A revocation issued before the listener existed carries no
        // notification for it; check after registering.
        if context.revoked(epoch) {
            return TimerSignal::Cancelled;
        }

        let wait = one_shot.wait_until(deadline);
        pin_mut!(wait);
        pin_mut!(listener);
        match select(wait, listener).await {
            Either::Left((signal, _)) => return signal,
            Either::Right(((), _)) => {
                if context.revoked(epoch) {
                    return TimerSignal::Cancelled;
                }
                // Stale notification from an earlier schedule; re-arm at
                // the same deadline.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::SteadyClock;
    use std::time::Instant;

    #[test]
    fn duration_rearm_measures_from_the_completion() {
        let origin = Instant::now();
        let interval = Duration::from_millis(100);
        let mut schedule = Schedule::<SteadyClock> {
            policy: SchedulePolicy::DurationRelative,
            interval,
            anchor: origin,
        };

        // The completion ran 30ms late.
        let completion = origin + Duration::from_millis(130);
        assert_eq!(schedule.elapsed(completion), Duration::from_millis(130));

        let next = schedule.rearm(completion);
        assert_eq!(next, completion + interval);
        assert_eq!(schedule.anchor, completion);
    }

    #[test]
    fn timepoint_rearm_stays_on_the_grid() {
        let origin = Instant::now();
        let interval = Duration::from_millis(100);
        let mut schedule = Schedule::<SteadyClock> {
            policy: SchedulePolicy::TimepointRelative,
            interval,
            anchor: origin,
        };

        // Ten late completions; the armed instants never leave the grid.
        for tick in 1..=10u32 {
            let completion = origin + interval * tick + Duration::from_millis(37);
            assert_eq!(
                schedule.elapsed(completion),
                interval + Duration::from_millis(37)
            );

            let next = schedule.rearm(completion);
            assert_eq!(next, origin + interval * (tick + 1));
        }
    }

    #[test]
    fn cancel_revokes_the_current_schedule() {
        let context = ScheduleContext::new();
        assert!(!context.is_armed());

        let epoch = context.begin();
        assert!(context.is_armed());
        assert!(!context.revoked(epoch));

        context.request_cancel();
        assert!(context.revoked(epoch));
    }

    #[test]
    fn restart_revokes_only_the_predecessor() {
        let context = ScheduleContext::new();
        let first = context.begin();
        let second = context.begin();

        assert!(context.revoked(first));
        assert!(!context.revoked(second));
    }

    #[test]
    fn superseded_driver_cannot_settle_its_successor() {
        let context = ScheduleContext::new();
        let first = context.begin();
        let second = context.begin();

        context.settle(first);
        assert!(context.is_armed());

        context.settle(second);
        assert!(!context.is_armed());
    }

    #[test]
    fn cancel_before_any_start_revokes_nothing() {
        let context = ScheduleContext::new();
        context.request_cancel();

        let epoch = context.begin();
        assert!(!context.revoked(epoch));
    }

    #[test]
    fn cancel_of_a_settled_schedule_leaves_a_restart_alone() {
        let context = ScheduleContext::new();
        let first = context.begin();
        context.settle(first);
        context.request_cancel();

        let second = context.begin();
        assert!(!context.revoked(second));
    }
}
