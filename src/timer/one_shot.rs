//! One-shot waits and the completion signals they deliver.

use crate::prelude::*;
use crate::timer::clock::Clock;

/// What a completed wait reports to the periodic callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    /// The deadline was reached.
    Elapsed,
    /// The wait was cancelled before its deadline.
    Cancelled,
    /// The reactor gave up on the wait for some other reason, e.g. it is
    /// shutting down. The callback's return value still decides whether
    /// the schedule keeps going.
    Faulted,
}

impl TimerSignal {
    /// Whether this completion is the terminal cancellation notice.
    pub fn is_cancelled(self) -> bool {
        matches!(self, TimerSignal::Cancelled)
    }

    /// Whether the deadline elapsed normally.
    pub fn is_elapsed(self) -> bool {
        matches!(self, TimerSignal::Elapsed)
    }
}

/// A single-deadline wait on some reactor.
///
/// One arm request produces exactly one completion. The scheduler arms the
/// next wait only from inside the previous completion, so implementations
/// never see overlapping calls on one value. A wait future dropped before
/// completion counts as never armed; the next call starts fresh.
#[async_trait]
pub trait OneShotWait<C: Clock>: Send {
    /// Arm at an absolute deadline and resolve once it elapses or the
    /// reactor drops the wait early.
    async fn wait_until(&mut self, deadline: C::TimePoint) -> TimerSignal;

    /// Arm `delay` from the current clock reading.
    async fn wait_after(&mut self, delay: Duration) -> TimerSignal {
        self.wait_until(C::advance(C::now(), delay)).await
    }
}

/// One-shot wait backed by the reactor the timer was built over.
///
/// Deadlines already reached resolve straight away, which is what lets an
/// overrunning timepoint schedule fire back-to-back. Resolves `Elapsed`
/// only; cancellation is layered above by the scheduler.
#[derive(Clone, Debug)]
pub struct ReactorOneShot {
    kind: ReactorKind,
}

impl ReactorOneShot {
    /// A one-shot wait over the given reactor binding.
    pub fn new(kind: ReactorKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl<C: Clock> OneShotWait<C> for ReactorOneShot {
    async fn wait_until(&mut self, deadline: C::TimePoint) -> TimerSignal {
        let delay = C::until(deadline);

        match &self.kind {
            ReactorKind::Smol => {
                AsyncTimer::after(delay).await;
            }
            ReactorKind::Tokio(handle) => {
                // Bind the sleep to its runtime here, so the driver may be
                // polled from any thread.
                let sleep = {
                    let _guard = handle.enter();
                    sleep_by_tokio(delay)
                };
                sleep.await;
            }
        }

        TimerSignal::Elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::clock::SteadyClock;
    use std::time::Instant;

    #[test]
    fn reached_deadline_resolves_immediately() {
        let mut one_shot = ReactorOneShot::new(ReactorKind::Smol);

        let begin = Instant::now();
        let signal = smol::block_on(<ReactorOneShot as OneShotWait<SteadyClock>>::wait_until(
            &mut one_shot,
            begin,
        ));

        assert_eq!(signal, TimerSignal::Elapsed);
        assert!(begin.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn wait_until_respects_the_deadline() {
        let mut one_shot = ReactorOneShot::new(ReactorKind::Smol);

        let deadline = Instant::now() + Duration::from_millis(50);
        let signal = smol::block_on(<ReactorOneShot as OneShotWait<SteadyClock>>::wait_until(
            &mut one_shot,
            deadline,
        ));

        assert_eq!(signal, TimerSignal::Elapsed);
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn tokio_wait_polls_from_any_thread() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let mut one_shot = ReactorOneShot::new(ReactorKind::Tokio(rt.handle().clone()));

        let deadline = Instant::now() + Duration::from_millis(30);
        let signal = smol::block_on(<ReactorOneShot as OneShotWait<SteadyClock>>::wait_until(
            &mut one_shot,
            deadline,
        ));

        assert_eq!(signal, TimerSignal::Elapsed);
        assert!(Instant::now() >= deadline);
    }
}
