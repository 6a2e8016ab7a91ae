//! Event Loop
//!
//! The event loop defers recomputation of computeds and re-runs of watchers
//! so that a burst of synchronous mutations is handled once, in priority
//! order, instead of after every single write.
//!
//! # Drain passes
//!
//! `drain()` runs in passes. Each pass snapshots the queue and executes it
//! in priority order (lower value first, FIFO among equal priorities). Tasks
//! submitted while a pass runs are never executed re-entrantly: they form
//! the next pass of the same drain. Draining stops when a pass finds the
//! queue empty, or fails after `Config::max_drain_passes` passes.
//!
//! # Tick hook
//!
//! The host decides when to drain. If a tick hook is installed it is called
//! exactly once each time the queue goes from empty to non-empty outside of
//! a drain, which is where a host schedules its microtask.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::queue::PriorityQueue;
use crate::config::Config;
use crate::error::{Error, Result};

type Task = Box<dyn FnOnce() -> Result<()>>;

#[derive(Default)]
struct LoopState {
    queue: RefCell<PriorityQueue<Task>>,
    draining: Cell<bool>,
    tick_hook: RefCell<Option<Rc<dyn Fn()>>>,
}

thread_local! {
    static LOOP: LoopState = LoopState::default();
}

/// Resets the draining flag when the drain exits, including on unwind.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        LOOP.with(|state| state.draining.set(false));
    }
}

/// Put unrun tasks back ahead of anything queued since their pass started.
fn requeue(tasks: impl IntoIterator<Item = Task>) {
    LOOP.with(|state| {
        let mut queue = state.queue.borrow_mut();
        for task in tasks {
            queue.push(i32::MIN, task);
        }
    });
}

/// The thread's deferred-task queue.
pub struct EventLoop;

impl EventLoop {
    /// Enqueue `task` at `priority`.
    pub fn submit<F>(priority: i32, task: F)
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        let hook = LOOP.with(|state| {
            let mut queue = state.queue.borrow_mut();
            let was_empty = queue.is_empty();
            queue.push(priority, Box::new(task));

            if was_empty && !state.draining.get() {
                state.tick_hook.borrow().clone()
            } else {
                None
            }
        });

        if let Some(hook) = hook {
            hook();
        }
    }

    /// Execute queued tasks until the queue is empty.
    ///
    /// # Errors
    ///
    /// `ReentrantDrain` if called from inside a drain, `DrainLimit` if the
    /// queue keeps refilling, or the first error a task returns.
    pub fn drain() -> Result<()> {
        if LOOP.with(|state| state.draining.replace(true)) {
            return Err(Error::ReentrantDrain);
        }
        let _guard = DrainGuard;
        let max_passes = Config::with(|config| config.max_drain_passes);

        let mut passes = 0;
        loop {
            let batch = LOOP.with(|state| state.queue.borrow_mut().take());
            if batch.is_empty() {
                return Ok(());
            }
            if passes == max_passes {
                let queued = batch.len();
                requeue(batch);
                tracing::warn!(passes, queued, "event loop drain aborted");
                return Err(Error::DrainLimit { passes });
            }

            passes += 1;
            tracing::debug!(pass = passes, tasks = batch.len(), "event loop pass");

            let mut tasks = batch.into_iter();
            while let Some(task) = tasks.next() {
                if let Err(err) = task() {
                    let queued = tasks.len();
                    if queued > 0 {
                        tracing::warn!(queued, %err, "event loop drain aborted");
                    }
                    requeue(tasks);
                    return Err(err);
                }
            }
        }
    }

    /// Whether no task is queued.
    pub fn is_empty() -> bool {
        LOOP.with(|state| state.queue.borrow().is_empty())
    }

    /// Number of queued tasks.
    pub fn len() -> usize {
        LOOP.with(|state| state.queue.borrow().len())
    }

    /// Whether a drain is running on this thread.
    pub fn is_draining() -> bool {
        LOOP.with(|state| state.draining.get())
    }

    /// Install (or remove) the hook called when work becomes available.
    pub fn set_tick_hook(hook: Option<Rc<dyn Fn()>>) {
        LOOP.with(|state| *state.tick_hook.borrow_mut() = hook);
    }

    /// Drop every queued task and the tick hook.
    pub fn clear() {
        let tasks = LOOP.with(|state| {
            state.tick_hook.borrow_mut().take();
            state.queue.borrow_mut().take()
        });
        drop(tasks);
    }
}
