//! Ordered task storage and per-run counters.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::task::{Gate, Producer, Task};

/// Per-run bookkeeping wrapped around one queued task.
pub(crate) struct TaskSlot<V, E> {
    pub(crate) id: Uuid,
    pub(crate) enqueued_at: DateTime<Utc>,
    /// Taken exactly once, when the task is fired. `None` afterwards, or
    /// when the task was cancelled before start.
    pub(crate) producer: Option<Producer<V, E>>,
    pub(crate) gate: Option<Gate>,
    pub(crate) started: bool,
    pub(crate) cancelled: bool,
    pub(crate) start_index: Option<usize>,
    pub(crate) finish_index: Option<usize>,
}

impl<V, E> From<Task<V, E>> for TaskSlot<V, E> {
    fn from(task: Task<V, E>) -> Self {
        Self {
            id: task.id,
            enqueued_at: task.enqueued_at,
            producer: Some(task.producer),
            gate: task.gate,
            started: false,
            cancelled: false,
            start_index: None,
            finish_index: None,
        }
    }
}

/// The ordered list of queued tasks for the current run.
pub(crate) struct TaskRegistry<V, E> {
    slots: Vec<TaskSlot<V, E>>,
}

impl<V, E> TaskRegistry<V, E> {
    pub(crate) fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Append a task, returning its insertion index.
    pub(crate) fn push(&mut self, task: Task<V, E>) -> usize {
        self.slots.push(task.into());
        self.slots.len() - 1
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn slot(&self, index: usize) -> &TaskSlot<V, E> {
        &self.slots[index]
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut TaskSlot<V, E> {
        &mut self.slots[index]
    }

    /// Drop all slots at the end of a run.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Mutable run counters, reset after every completed run.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    /// Number of tasks currently in flight. Never exceeds the limit.
    pub(crate) running: usize,
    /// Insertion index of the next task to start.
    pub(crate) next_start: usize,
    /// Next finish-order index to hand out.
    pub(crate) next_finish: usize,
    pub(crate) active: bool,
    pub(crate) cancel_requested: bool,
}

impl RunState {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
