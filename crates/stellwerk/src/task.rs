//! Task descriptors: deferred work plus an optional admission gate.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Boxed future returned by a producer once the task is invoked.
pub type TaskFuture<V, E> = Pin<Box<dyn Future<Output = Result<V, E>> + Send>>;

/// Deferred producer: invoked at most once, when its task is admitted.
pub type Producer<V, E> = Box<dyn FnOnce() -> TaskFuture<V, E> + Send>;

/// Gating predicate evaluated right before a task would start.
pub type Gate = Box<dyn Fn() -> bool + Send>;

/// A queued unit of deferred work.
///
/// The producer closure is not invoked when the task is built or enqueued —
/// only when the scheduler admits it, and never if the task is cancelled or
/// gated off first.
pub struct Task<V, E> {
    pub(crate) id: Uuid,
    pub(crate) enqueued_at: DateTime<Utc>,
    pub(crate) producer: Producer<V, E>,
    pub(crate) gate: Option<Gate>,
}

impl<V, E> Task<V, E> {
    /// Wrap a deferred producer into a task.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            producer: Box::new(move || Box::pin(producer())),
            gate: None,
        }
    }

    /// Attach an admission gate.
    ///
    /// The gate runs at admission time; returning `false` cancels the task
    /// instead of starting it, without ever invoking the producer.
    pub fn gated<G>(mut self, gate: G) -> Self
    where
        G: Fn() -> bool + Send + 'static,
    {
        self.gate = Some(Box::new(gate));
        self
    }

    /// Unique id assigned when the task was built.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// When the task was built.
    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}

impl<V, E> fmt::Debug for Task<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("enqueued_at", &self.enqueued_at)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}
