//! Next-poll scheduling under active-hours constraints.
//!
//! The upstream is rate limited, so the tracker sleeps long while no
//! session is near and polls on a fixed cadence once the nearest session's
//! approach window opens. Every wake-up is then pushed into the configured
//! active hours of the reference timezone. The [`Scheduler`] only computes;
//! the caller owns the timer.

mod active_hours;
mod core;


pub use self::core::{should_accelerate, PollPlan, PollReason, Scheduler};
