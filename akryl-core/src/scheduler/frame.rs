//! Animation frames and rebuild coalescing.
//!
//! Widget rebuilds are not run when a dependency fires. They are requested
//! for the next animation frame, and a [`RebuildScheduler`] makes sure an
//! element asks for at most one rebuild per frame.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::Result;

type FrameTask = Box<dyn FnOnce() -> Result<()>>;

thread_local! {
    static FRAME: RefCell<Vec<FrameTask>> = const { RefCell::new(Vec::new()) };
}

/// The thread's animation frame queue.
pub struct AnimationFrame;

impl AnimationFrame {
    /// Run `task` on the next frame.
    pub fn request<F>(task: F)
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        FRAME.with(|frame| frame.borrow_mut().push(Box::new(task)));
    }

    /// Run the current frame. Tasks requested while it runs belong to the
    /// following frame.
    pub fn run() -> Result<()> {
        let tasks = FRAME.with(|frame| std::mem::take(&mut *frame.borrow_mut()));
        if tasks.is_empty() {
            return Ok(());
        }

        tracing::debug!(tasks = tasks.len(), "running animation frame");
        let mut tasks = tasks.into_iter();
        while let Some(task) = tasks.next() {
            if let Err(err) = task() {
                tracing::warn!(queued = tasks.len(), %err, "animation frame aborted");
                // Unrun tasks stay ahead of those requested during this frame.
                FRAME.with(|frame| {
                    let mut frame = frame.borrow_mut();
                    let later = std::mem::take(&mut *frame);
                    frame.extend(tasks);
                    frame.extend(later);
                });
                return Err(err);
            }
        }
        Ok(())
    }

    /// Number of tasks waiting for the next frame.
    pub fn pending() -> usize {
        FRAME.with(|frame| frame.borrow().len())
    }

    /// Drop every pending task.
    pub fn clear() {
        let tasks = FRAME.with(|frame| std::mem::take(&mut *frame.borrow_mut()));
        drop(tasks);
    }
}

/// Clears a scheduler's pending flag when its frame task runs or is
/// dropped unrun.
struct PendingGuard(Rc<Cell<bool>>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Coalesces rebuild requests of one element into a single frame task.
#[derive(Debug, Default, Clone)]
pub struct RebuildScheduler {
    scheduled: Rc<Cell<bool>>,
}

impl RebuildScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `rebuild` for the next frame unless one is already pending.
    pub fn schedule<F>(&self, rebuild: F)
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        if self.scheduled.replace(true) {
            return;
        }

        let guard = PendingGuard(self.scheduled.clone());
        AnimationFrame::request(move || {
            drop(guard);
            rebuild()
        });
    }

    /// Whether a rebuild is waiting for the next frame.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}
