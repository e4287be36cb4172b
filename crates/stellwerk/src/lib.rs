//! Bounded-concurrency task scheduler.
//!
//! Queue deferred tasks, run at most `max_limit` of them at once, and get
//! back one [`OutcomeHandle`] per task. Tasks are started strictly in
//! insertion order; finish order depends on how long each producer takes.
//! Cancellation is cooperative: [`Scheduler::stop`] prevents tasks that have
//! not started yet from ever being invoked, while in-flight tasks settle
//! normally.

pub mod config;
pub mod error;
pub mod events;
pub mod outcome;
pub mod scheduler;
pub mod task;

mod admission;
mod registry;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use events::SchedulerEvent;
pub use outcome::{OutcomeHandle, TaskOutcome};
pub use scheduler::Scheduler;
pub use task::Task;
