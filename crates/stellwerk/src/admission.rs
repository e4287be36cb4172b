//! The admission control loop.
//!
//! [`Engine`] owns every piece of mutable run state behind one mutex: the
//! task registry, the run counters, the outcome binder, and the event bus.
//! Exactly one admission step executes at a time; the lock is never held
//! across an await. Concurrency comes from spawned producer futures whose
//! completions re-enter the loop through [`Engine::complete`] and [`pump`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::events::{EventBus, SchedulerEvent};
use crate::outcome::{OutcomeBinder, TaskOutcome};
use crate::registry::{RunState, TaskRegistry};
use crate::task::Producer;

pub(crate) type SharedEngine<V, E> = Arc<Mutex<Engine<V, E>>>;

/// Lock the engine, recovering the guard if a panicking producer ever
/// poisoned the mutex. Critical sections are short and purely bookkeeping.
pub(crate) fn lock_engine<V, E>(engine: &SharedEngine<V, E>) -> MutexGuard<'_, Engine<V, E>> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of one admission step.
pub(crate) enum Admission<V, E> {
    /// Every task is accounted for; the run has completed and state is reset.
    Complete,
    /// Nothing to do: limit reached, all remaining tasks started, or idle.
    Saturated,
    /// A task was admitted; its producer must now be invoked and driven.
    Launched { index: usize, producer: Producer<V, E> },
    /// The task at the cursor was cancelled before start. No asynchronous
    /// work is pending, so admission must be re-evaluated immediately.
    CancelledBeforeStart,
}

/// All mutable scheduler state, serialized behind the control-loop mutex.
pub(crate) struct Engine<V, E> {
    pub(crate) config: SchedulerConfig,
    pub(crate) registry: TaskRegistry<V, E>,
    pub(crate) run: RunState,
    pub(crate) binder: OutcomeBinder<V, E>,
    pub(crate) bus: EventBus,
}

impl<V, E> Engine<V, E> {
    pub(crate) fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            registry: TaskRegistry::new(),
            run: RunState::default(),
            binder: OutcomeBinder::empty(),
            bus: EventBus::new(),
        }
    }

    /// One evaluation of the admission rules, in order: run complete, admit
    /// next task, or nothing to do.
    pub(crate) fn consider_admitting_more(&mut self) -> Admission<V, E> {
        if !self.run.active {
            return Admission::Saturated;
        }
        let total = self.registry.len();
        if self.run.next_finish == total {
            self.finish_run();
            return Admission::Complete;
        }
        if self.run.running < self.config.max_limit && self.run.next_start < total {
            let index = self.run.next_start;
            return self.fire(index);
        }
        Admission::Saturated
    }

    /// Mark the task at `index` started and either launch or cancel it.
    fn fire(&mut self, index: usize) -> Admission<V, E> {
        let start_index = self.run.next_start;
        self.run.next_start += 1;
        self.run.running += 1;

        let cancel_requested = self.run.cancel_requested;
        let slot = self.registry.slot_mut(index);
        debug_assert!(!slot.started && !slot.cancelled, "task admitted twice");
        slot.started = true;
        slot.start_index = Some(start_index);
        let gated_off =
            cancel_requested || !slot.gate.as_ref().map_or(true, |gate| gate());

        if gated_off {
            return self.cancel_before_start(index);
        }

        let Some(producer) = self.registry.slot_mut(index).producer.take() else {
            warn!(index, "task fired with no producer left; treating as cancelled");
            return self.cancel_before_start(index);
        };

        let slot = self.registry.slot(index);
        let id = slot.id;
        let queued_ms = (Utc::now() - slot.enqueued_at).num_milliseconds();
        debug!(index, %id, queued_ms, running = self.run.running, "task started");
        self.bus.emit(SchedulerEvent::TaskStarted { index, id });
        Admission::Launched { index, producer }
    }

    fn cancel_before_start(&mut self, index: usize) -> Admission<V, E> {
        self.registry.slot_mut(index).cancelled = true;
        self.record_finish(index);
        let id = self.registry.slot(index).id;
        debug!(index, %id, "task cancelled before start");
        let slot = self.outcome_slot(index);
        self.binder.settle(slot, TaskOutcome::Cancelled);
        self.bus.emit(SchedulerEvent::TaskCancelled { index, id });
        Admission::CancelledBeforeStart
    }

    /// Settle a producer's result. Called once per launched task, from the
    /// spawned future that drove it.
    pub(crate) fn complete(&mut self, index: usize, result: Result<V, E>) {
        self.record_finish(index);
        let slot = self.outcome_slot(index);
        let id = self.registry.slot(index).id;
        match result {
            Ok(value) => {
                debug!(index, %id, running = self.run.running, "task finished");
                self.bus.emit(SchedulerEvent::TaskFinished { index, id });
                self.binder.settle(slot, TaskOutcome::Finished(value));
            }
            Err(error) => {
                warn!(index, %id, running = self.run.running, "task failed");
                self.bus.emit(SchedulerEvent::TaskFailed { index, id });
                self.binder.settle(slot, TaskOutcome::Failed(error));
            }
        }
    }

    /// Assign the next finish-order index and release the task's running slot.
    fn record_finish(&mut self, index: usize) {
        let finish_index = self.run.next_finish;
        self.run.next_finish += 1;
        self.run.running -= 1;
        self.registry.slot_mut(index).finish_index = Some(finish_index);
    }

    /// Which physical outcome slot a settlement binds to: start order when
    /// configured as ordered, finish order otherwise. Only meaningful once
    /// the task's indices have been assigned.
    fn outcome_slot(&self, index: usize) -> usize {
        let slot = self.registry.slot(index);
        if self.config.ordered {
            slot.start_index.unwrap_or(index)
        } else {
            slot.finish_index.unwrap_or(index)
        }
    }

    fn finish_run(&mut self) {
        info!(total = self.registry.len(), "all tasks finished");
        self.bus.emit(SchedulerEvent::AllTasksFinished);
        self.registry.clear();
        self.binder.clear();
        self.run.reset();
    }
}

/// Drive admissions until the limit is reached, the queue is drained, or the
/// run completes. Called after `start()`, after `stop()`, and after every
/// settlement — this loop is both the initial fan-out and the synchronous
/// cancellation drain.
pub(crate) fn pump<V, E>(engine: &SharedEngine<V, E>)
where
    V: Send + 'static,
    E: Send + 'static,
{
    loop {
        let admission = lock_engine(engine).consider_admitting_more();
        match admission {
            Admission::Complete | Admission::Saturated => return,
            Admission::CancelledBeforeStart => continue,
            Admission::Launched { index, producer } => {
                let engine = Arc::clone(engine);
                tokio::spawn(async move {
                    let result = producer().await;
                    lock_engine(&engine).complete(index, result);
                    pump(&engine);
                });
            }
        }
    }
}
