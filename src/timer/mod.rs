//! timer is the core module of the library , it provides the clock sources ,
//! the one-shot wait seam and the re-arming schedule driver.

pub mod clock;
pub mod one_shot;
pub mod timer_core;
