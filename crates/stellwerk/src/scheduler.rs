//! Scheduler facade: task intake, run lifecycle, and cancellation.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::admission::{lock_engine, pump, Engine, SharedEngine};
use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::events::SchedulerEvent;
use crate::outcome::{OutcomeBinder, OutcomeHandle};
use crate::task::Task;

/// Bounded-concurrency task scheduler.
///
/// Queued tasks are started strictly in insertion order, at most
/// `max_limit` in flight at once. `start()` returns one [`OutcomeHandle`]
/// per queued task, laid out in insertion order; the scheduler resets
/// itself once every task is accounted for and can then be reused.
///
/// # Example
/// ```ignore
/// let scheduler = Scheduler::with_limit(2)?;
/// scheduler.add(Task::new(|| async { fetch_page(0).await }))?;
/// scheduler.add(Task::new(|| async { fetch_page(1).await }))?;
/// let handles = scheduler.start()?;
/// for handle in handles {
///     match handle.await {
///         TaskOutcome::Finished(page) => process(page),
///         TaskOutcome::Failed(err) => report(err),
///         TaskOutcome::Cancelled => {}
///     }
/// }
/// ```
pub struct Scheduler<V, E> {
    engine: SharedEngine<V, E>,
}

impl<V, E> Clone for Scheduler<V, E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<V, E> Scheduler<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    /// Build a scheduler from the given config.
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self {
            engine: Arc::new(Mutex::new(Engine::new(config))),
        })
    }

    /// Scheduler with the given concurrency limit and default ordering.
    pub fn with_limit(max_limit: usize) -> Result<Self, SchedulerError> {
        Self::new(SchedulerConfig::with_limit(max_limit))
    }

    /// Scheduler pre-loaded with an initial batch of tasks.
    pub fn with_tasks(
        config: SchedulerConfig,
        tasks: impl IntoIterator<Item = Task<V, E>>,
    ) -> Result<Self, SchedulerError> {
        let scheduler = Self::new(config)?;
        scheduler.add_many(tasks)?;
        Ok(scheduler)
    }

    /// Subscribe to lifecycle events emitted from this point on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SchedulerEvent> {
        lock_engine(&self.engine).bus.subscribe()
    }

    /// Enqueue one task for the next run.
    ///
    /// Fails while a run is active: the task list may not change under a
    /// running admission loop.
    pub fn add(&self, task: Task<V, E>) -> Result<(), SchedulerError> {
        self.add_many(std::iter::once(task))
    }

    /// Enqueue a batch of tasks, preserving iteration order.
    pub fn add_many(
        &self,
        tasks: impl IntoIterator<Item = Task<V, E>>,
    ) -> Result<(), SchedulerError> {
        let mut engine = lock_engine(&self.engine);
        if engine.run.active {
            return Err(SchedulerError::MutationWhileRunning);
        }
        for task in tasks {
            let id = task.id();
            let index = engine.registry.push(task);
            debug!(index, %id, "task enqueued");
            engine.bus.emit(SchedulerEvent::TaskEnqueued { index, id });
        }
        Ok(())
    }

    /// Begin a run over the queued tasks.
    ///
    /// Returns one handle per queued task, in insertion order, and admits up
    /// to `max_limit` tasks before returning. Producer futures are spawned
    /// onto the ambient tokio runtime, so this must be called from within
    /// one. A run over zero tasks completes immediately.
    pub fn start(&self) -> Result<Vec<OutcomeHandle<V, E>>, SchedulerError> {
        let handles = {
            let mut engine = lock_engine(&self.engine);
            if engine.run.active {
                return Err(SchedulerError::AlreadyRunning);
            }
            let total = engine.registry.len();
            let (binder, handles) = OutcomeBinder::bind(total);
            engine.binder = binder;
            engine.run.active = true;
            info!(total, max_limit = engine.config.max_limit, "run started");
            handles
        };
        pump(&self.engine);
        Ok(handles)
    }

    /// Request cooperative cancellation.
    ///
    /// Every task that has not started yet settles as cancelled, its
    /// producer never invoked. In-flight producers are not preempted and
    /// settle through the normal completion path. A no-op while idle.
    pub fn stop(&self) {
        {
            let mut engine = lock_engine(&self.engine);
            if !engine.run.active {
                debug!("stop requested while idle");
                return;
            }
            engine.run.cancel_requested = true;
            let pending = engine.registry.len() - engine.run.next_start;
            info!(pending, "stop requested");
        }
        pump(&self.engine);
    }

    /// Whether a run is currently active.
    pub fn is_active(&self) -> bool {
        lock_engine(&self.engine).run.active
    }

    /// Number of tasks currently in flight.
    pub fn running(&self) -> usize {
        lock_engine(&self.engine).run.running
    }

    /// Number of tasks queued for the current or next run.
    pub fn queued(&self) -> usize {
        lock_engine(&self.engine).registry.len()
    }
}
