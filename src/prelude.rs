//! A "prelude" for users of the `periodic-timer` crate.
//!
//! This prelude is similar to the standard library's prelude in that you'll
//! almost always want to import its entire contents, but unlike the standard
//! library's prelude you'll have to do so manually:
//!
//! ```
//! use periodic_timer::prelude::*;
//! ```
//!
//! The prelude may grow over time as additional items see ubiquitous use.

pub use crate::entity::{PeriodicTimer, PeriodicTimerBuilder, ReactorKind, TimerCanceller};
pub use crate::error::*;
pub use crate::timer::clock::{Clock, HighResolutionClock, SteadyClock, SystemClock};
pub use crate::timer::one_shot::{OneShotWait, ReactorOneShot, TimerSignal};
pub use crate::timer::timer_core::{state, SchedulePolicy};

pub use anyhow::{anyhow, Result as AnyResult};
pub use async_trait::async_trait;
pub use smol::spawn as async_spawn_by_smol;
pub use smol::Task as SmolJoinHandler;
pub use thiserror::Error;

pub use tokio::task::{spawn as async_spawn_by_tokio, JoinHandle as TokioJoinHandle};
pub use tokio::time::sleep as sleep_by_tokio;

pub(crate) use crate::timer::timer_core::{drive, Schedule, ScheduleContext};
pub(crate) use log::{debug, info, trace};
pub(crate) use smol::Timer as AsyncTimer;
pub(crate) use std::time::Duration;
pub(crate) use tracing::{info_span, Instrument};
