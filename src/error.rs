//! Public error of periodic-timer.

use crate::prelude::*;

/// Error enumeration for timer operations.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
pub enum TimerError {
    /// A schedule interval must be greater than zero.
    #[error("The schedule interval must be greater than zero.")]
    ZeroInterval,
    /// The timer behind a detached canceller is no longer alive.
    #[error("The timer behind this canceller is no longer alive.")]
    Expired,
}
