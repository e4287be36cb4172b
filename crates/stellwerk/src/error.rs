//! Scheduler error types.

use thiserror::Error;

/// Errors raised synchronously by scheduler operations.
///
/// A failing task producer is never one of these: producer errors surface
/// only through the task's bound [`crate::OutcomeHandle`].
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("tasks cannot be added while a run is active")]
    MutationWhileRunning,

    #[error("scheduler is already running")]
    AlreadyRunning,
}
