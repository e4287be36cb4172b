//! Lifecycle event channel.
//!
//! Observers call [`crate::Scheduler::subscribe`] and receive every event
//! emitted afterwards, in emission order. Emission never blocks; closed
//! subscribers are dropped silently.

use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Lifecycle notifications emitted by the scheduler.
///
/// Task events carry the task's insertion index and id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SchedulerEvent {
    TaskEnqueued { index: usize, id: Uuid },
    TaskStarted { index: usize, id: Uuid },
    TaskCancelled { index: usize, id: Uuid },
    TaskFinished { index: usize, id: Uuid },
    TaskFailed { index: usize, id: Uuid },
    AllTasksFinished,
}

/// Fans scheduler events out to any number of subscribers.
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a new subscriber and return its receiving end.
    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SchedulerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver an event to all live subscribers, pruning closed ones.
    pub(crate) fn emit(&mut self, event: SchedulerEvent) {
        tracing::trace!(?event, "scheduler event");
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
