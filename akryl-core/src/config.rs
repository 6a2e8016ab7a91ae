//! Runtime Configuration
//!
//! Tunables for the change detector and the schedulers. The runtime is
//! single-threaded, so the active configuration lives in thread-local
//! storage next to the tracking stack and the queues it governs.
//!
//! # Example
//!
//! ```rust,ignore
//! use akryl_core::Config;
//!
//! let config = Config::from_json(r#"{ "max_tracking_depth": 64 }"#)?;
//! config.install();
//! assert_eq!(Config::current().max_tracking_depth, 64);
//! ```

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunables for the reactive runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum nesting of tracked evaluations before `TrackerOverflow`.
    pub max_tracking_depth: usize,

    /// Event loop priority used to recompute invalidated computeds.
    pub computed_priority: i32,

    /// Event loop priority used to re-run invalidated watchers.
    /// Must be larger than `computed_priority` so watchers observe settled values.
    pub watcher_priority: i32,

    /// Maximum number of passes a single drain may execute.
    pub max_drain_passes: usize,

    /// Maximum number of drain/frame rounds `Runtime::flush` performs.
    pub max_flush_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_tracking_depth: 1000,
            computed_priority: 100,
            watcher_priority: 200,
            max_drain_passes: 10_000,
            max_flush_rounds: 1_000,
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Config> = RefCell::new(Config::default());
}

impl Config {
    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The configuration active on this thread.
    pub fn current() -> Config {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Make this configuration the active one on this thread.
    pub fn install(self) {
        tracing::debug!(config = ?self, "installing runtime config");
        CURRENT.with(|current| *current.borrow_mut() = self);
    }

    /// Restore the default configuration on this thread.
    pub fn reset() {
        Config::default().install();
    }

    pub(crate) fn with<R>(f: impl FnOnce(&Config) -> R) -> R {
        CURRENT.with(|current| f(&current.borrow()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.max_tracking_depth, 1000);
        assert_eq!(config.computed_priority, 100);
        assert_eq!(config.watcher_priority, 200);
        assert!(config.computed_priority < config.watcher_priority);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "max_tracking_depth": 8 }"#).unwrap();
        assert_eq!(config.max_tracking_depth, 8);
        assert_eq!(config.watcher_priority, 200);
    }

    #[test]
    fn invalid_json_is_a_config_error() {
        let err = Config::from_json("{ nope").unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn install_and_reset() {
        Config {
            max_drain_passes: 3,
            ..Config::default()
        }
        .install();
        assert_eq!(Config::current().max_drain_passes, 3);

        Config::reset();
        assert_eq!(Config::current(), Config::default());
    }
}
