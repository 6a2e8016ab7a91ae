//! Reactive Runtime
//!
//! The runtime facade ties the thread's deferred queues together. A host
//! normally drains the event loop from its microtask callback and runs
//! animation frames from its frame callback. Tests and headless hosts call
//! [`Runtime::flush`] instead, which alternates both until nothing is left.
//!
//! # How It Works
//!
//! 1. A mutation fires an observable. Computeds and watchers that read it
//!    submit tasks to the event loop; widget builds request a rebuild for the
//!    next animation frame.
//!
//! 2. `flush` drains the event loop, then runs one frame. Rebuilds may read
//!    computeds or create watchers, which can queue more event loop work.
//!
//! 3. This repeats until both queues are empty.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::scheduler::{AnimationFrame, EventLoop};

/// Thread-scoped runtime controls.
pub struct Runtime;

impl Runtime {
    /// Drain the event loop and run animation frames until both are idle.
    ///
    /// # Errors
    ///
    /// Propagates the first task error, or `DrainLimit` if the queues did not
    /// settle within `Config::max_flush_rounds` rounds.
    pub fn flush() -> Result<()> {
        let max_rounds = Config::with(|config| config.max_flush_rounds);

        for round in 0..max_rounds {
            if Self::is_idle() {
                if round > 0 {
                    tracing::debug!(rounds = round, "runtime flushed");
                }
                return Ok(());
            }
            EventLoop::drain()?;
            AnimationFrame::run()?;
        }

        if Self::is_idle() {
            return Ok(());
        }
        tracing::warn!(rounds = max_rounds, "runtime did not settle");
        Err(Error::DrainLimit { passes: max_rounds })
    }

    /// Whether neither queue holds work.
    pub fn is_idle() -> bool {
        EventLoop::is_empty() && AnimationFrame::pending() == 0
    }

    /// Drop all queued work and restore the default configuration.
    pub fn reset() {
        EventLoop::clear();
        AnimationFrame::clear();
        Config::reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn flush_alternates_queues_until_idle() {
        let done = Rc::new(Cell::new(false));
        let done_clone = done.clone();

        AnimationFrame::request(move || {
            EventLoop::submit(0, move || {
                done_clone.set(true);
                Ok(())
            });
            Ok(())
        });

        Runtime::flush().unwrap();
        assert!(done.get());
        assert!(Runtime::is_idle());
    }

    #[test]
    fn flush_bounded_by_rounds() {
        Config {
            max_flush_rounds: 3,
            ..Config::default()
        }
        .install();

        fn again() -> Result<()> {
            AnimationFrame::request(again);
            Ok(())
        }
        AnimationFrame::request(again);

        assert_eq!(Runtime::flush(), Err(Error::DrainLimit { passes: 3 }));
        Runtime::reset();
        assert!(Runtime::is_idle());
    }
}
