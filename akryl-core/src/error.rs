//! Error types for the Akryl core runtime.
//!
//! Almost every variant here is an invariant violation: a framework or caller
//! bug such as mounting an element twice or draining the event loop from
//! inside a drain. They are returned to the caller of the entry point that
//! detected them and are never recovered from internally.
//!
//! A reconciliation mismatch (different key or widget kind) is not an error,
//! it selects the replace path of the reconciler.

use thiserror::Error;

/// Errors raised by the reactive runtime and the reconciler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Tracked evaluations nested deeper than the configured bound.
    #[error("change detector stack is too deep (limit {limit})")]
    TrackerOverflow {
        /// The configured maximum depth.
        limit: usize,
    },

    /// `EventLoop::drain` was called while a drain was already running.
    #[error("event loop is already draining")]
    ReentrantDrain,

    /// The event loop kept producing work past the configured number of passes.
    #[error("event loop did not settle after {passes} drain passes")]
    DrainLimit {
        /// Number of passes executed before giving up.
        passes: usize,
    },

    /// A render element was mounted twice, or after it was unmounted.
    #[error("render element `{element}` is already mounted")]
    AlreadyMounted {
        /// Name of the widget kind backing the element.
        element: &'static str,
    },

    /// A render element was unmounted while not mounted.
    #[error("render element `{element}` is not mounted")]
    NotMounted {
        /// Name of the widget kind backing the element.
        element: &'static str,
    },

    /// A key was asked for its element while no element carries it.
    #[error("key is not mounted")]
    KeyNotMounted,

    /// `State::created` would run a second time.
    #[error("state `{state}` is already created")]
    StateAlreadyCreated {
        /// Type name of the state.
        state: &'static str,
    },

    /// A lifecycle hook ran before `State::created`.
    #[error("state `{state}` is not created")]
    StateNotCreated {
        /// Type name of the state.
        state: &'static str,
    },

    /// `State::updated` ran while the owning element was not mounted.
    #[error("state `{state}` is not mounted")]
    StateNotMounted {
        /// Type name of the state.
        state: &'static str,
    },

    /// A late-initialized slot was read before it was assigned.
    #[error("late-initialized value `{name}` has not been initialized")]
    Uninitialized {
        /// Name given to the slot.
        name: &'static str,
    },

    /// A node operation needed a parent node but the node is detached.
    #[error("node has no parent")]
    Detached,

    /// A node was appended while it still had a parent.
    #[error("node already has a parent")]
    Attached,

    /// The DOM backend cannot perform the requested operation on this node.
    #[error("node does not support {operation}")]
    Unsupported {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Reactive data could not be exported because it contains a cycle.
    #[error("value graph contains a cycle")]
    Cycle,

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

/// Result type for Akryl core operations.
pub type Result<T> = std::result::Result<T, Error>;
