//! Decision procedures for session tracking.
//!
//! This crate provides:
//! - [`Evaluator`]: turns capacity snapshots into at most one alert per
//!   session per cycle, with severity precedence and anti-flap suppression
//! - [`Scheduler`]: picks the next wake-up, tightening the cadence as a
//!   session approaches and keeping wake-ups inside active hours
//! - human duration parsing for snooze lengths
//!
//! Both procedures are pure: state goes in by value and comes out by value.

pub mod duration;
pub mod evaluator;
pub mod scheduler;

pub use duration::parse_duration;
pub use evaluator::{Decision, Evaluation, Evaluator, Quiet};
pub use scheduler::{should_accelerate, PollPlan, PollReason, Scheduler};
