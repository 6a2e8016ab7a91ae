//! Scheduling
//!
//! Two deferred queues drive the runtime:
//!
//! - The [`EventLoop`] holds recomputation and watcher tasks, ordered by
//!   priority and drained once per host microtask.
//! - The [`AnimationFrame`] queue holds widget rebuilds, run once per frame.
//!
//! Both are thread-local. The runtime never drains them on its own; the host
//! (or [`Runtime::flush`](crate::reactive::Runtime::flush) in tests) does.

mod event_loop;
mod frame;
mod queue;

pub use event_loop::EventLoop;
pub use frame::{AnimationFrame, RebuildScheduler};
pub use queue::PriorityQueue;
