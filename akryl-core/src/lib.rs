//! Akryl Core
//!
//! This crate provides the runtime of the Akryl UI framework. It implements:
//!
//! - Reactive primitives (observables, signals, computeds, watchers)
//! - A cooperative scheduler with an event loop and an animation frame
//! - Widgets, render elements and tree reconciliation
//! - A reactive store of JSON-like values
//! - Scoped styles and a bridge to external component renderers
//!
//! The runtime is single-threaded: everything reactive lives on the thread
//! that created it. Only the type registries are process-wide.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Change detection and derived values
//! - `scheduler`: Event loop, priorities and frame-batched rebuilds
//! - `dom`: The node abstraction elements render into, plus an in-memory
//!   implementation
//! - `widget`: Widgets, elements, lifecycle and reconciliation
//! - `store`: Reactive lists, objects, maps and sets
//! - `style`: Per-widget-type style sheets
//! - `bridge`: Rendering through a host component library
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//!
//! use akryl_core::dom::MemoryDom;
//! use akryl_core::reactive::{Runtime, Signal};
//! use akryl_core::widget::{mount, BuildContext, HtmlWidget, StatelessWidget, Widget};
//!
//! struct Counter(Signal<i64>);
//!
//! impl StatelessWidget for Counter {
//!     fn build(&self, _ctx: &BuildContext) -> Widget {
//!         HtmlWidget::new("span").text(self.0.get().to_string()).into()
//!     }
//! }
//!
//! let count = Signal::new(0);
//! let container = MemoryDom::container();
//! let root = mount(&container, Rc::new(MemoryDom), &Widget::stateless(Counter(count.clone())))?;
//!
//! count.set(1);
//! // The rebuild runs on the next animation frame
//! Runtime::flush()?;
//! ```

pub mod bridge;
pub mod config;
pub mod dom;
pub mod error;
pub mod reactive;
pub mod scheduler;
pub mod store;
pub mod style;
pub mod widget;

pub use config::Config;
pub use error::{Error, Result};
