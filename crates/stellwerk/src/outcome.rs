//! Outcome handles and the binder that settles them.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::warn;

/// Final settlement of one scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<V, E> {
    /// The producer ran to completion and succeeded.
    Finished(V),
    /// The producer ran to completion and returned an error.
    Failed(E),
    /// The task was cancelled before its producer was ever invoked.
    Cancelled,
}

impl<V, E> TaskOutcome<V, E> {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Convert into a `Result`, mapping cancellation to `Ok(None)`.
    ///
    /// Cancellation is a resolution, not an error: a cancelled task carries
    /// no value but did not fail.
    pub fn into_result(self) -> Result<Option<V>, E> {
        match self {
            Self::Finished(value) => Ok(Some(value)),
            Self::Failed(error) => Err(error),
            Self::Cancelled => Ok(None),
        }
    }
}

/// The externally observable future for one task's eventual result.
///
/// Settles exactly once. Awaiting the handle yields the [`TaskOutcome`];
/// if the scheduler is dropped before the bound task ever starts, the
/// handle settles as [`TaskOutcome::Cancelled`].
#[derive(Debug)]
pub struct OutcomeHandle<V, E> {
    rx: oneshot::Receiver<TaskOutcome<V, E>>,
}

impl<V, E> Future for OutcomeHandle<V, E> {
    type Output = TaskOutcome<V, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(TaskOutcome::Cancelled),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Maps finished or cancelled tasks onto their pre-created outcome slots.
///
/// One sender per original insertion slot, created when a run starts. Each
/// sender is taken exactly once; a second settlement attempt on the same
/// slot violates the settle-once contract and is dropped with a warning
/// (and panics in debug builds).
pub(crate) struct OutcomeBinder<V, E> {
    slots: Vec<Option<oneshot::Sender<TaskOutcome<V, E>>>>,
}

impl<V, E> OutcomeBinder<V, E> {
    /// Create `count` bound slot/handle pairs, handles in insertion order.
    pub(crate) fn bind(count: usize) -> (Self, Vec<OutcomeHandle<V, E>>) {
        let mut slots = Vec::with_capacity(count);
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            let (tx, rx) = oneshot::channel();
            slots.push(Some(tx));
            handles.push(OutcomeHandle { rx });
        }
        (Self { slots }, handles)
    }

    /// Binder with no slots, for an idle scheduler.
    pub(crate) fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    /// Settle the given physical slot. Dropped receivers are ignored.
    pub(crate) fn settle(&mut self, slot: usize, outcome: TaskOutcome<V, E>) {
        match self.slots.get_mut(slot).and_then(Option::take) {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => {
                debug_assert!(false, "outcome slot {slot} settled twice");
                warn!(slot, "attempted to settle an already-settled outcome slot");
            }
        }
    }

    /// Drop all remaining senders, ready for the next run.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}
