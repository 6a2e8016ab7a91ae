//! Component stylesheets.
//!
//! A widget type may carry a [`Style`]. The first time an element of that
//! type is created its sheet is built against the type's scope prefix and
//! handed to the installed [`StyleSink`]. The core never looks at the CSS.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::widget::WidgetTypes;

/// Produces the stylesheet of a widget type.
pub trait Style {
    /// Build the sheet, scoped to elements whose `data-id` is `prefix`.
    fn build(&self, prefix: &str) -> String;
}

/// Receives stylesheets, e.g. by inserting `<style>` tags into a document.
pub trait StyleSink: Send + Sync {
    fn attach(&self, owner: &'static str, prefix: &str, css: &str);
    fn detach(&self, owner: &'static str, prefix: &str);
}

struct Sheet {
    owner: &'static str,
    prefix: String,
}

#[derive(Default)]
struct Registry {
    // `None` marks a type that was registered without a style.
    sheets: Mutex<HashMap<TypeId, Option<Sheet>>>,
    sink: RwLock<Option<Arc<dyn StyleSink>>>,
}

static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::default)
}

/// Process-wide record of which widget types had their style attached.
pub struct StyleRegistry;

impl StyleRegistry {
    /// Register the style of `W`. Returns `true` the first time `W` is seen.
    pub fn register<W: 'static>(style: Option<&dyn Style>) -> bool {
        let type_id = TypeId::of::<W>();
        let owner = std::any::type_name::<W>();

        {
            let mut sheets = registry().sheets.lock();
            if sheets.contains_key(&type_id) {
                return false;
            }
            sheets.insert(type_id, None);
        }

        // The lock is released while user code builds the sheet, which may
        // register further types.
        let Some(style) = style else {
            return true;
        };
        let prefix = WidgetTypes::register::<W>();
        let css = style.build(&prefix);
        registry().sheets.lock().insert(
            type_id,
            Some(Sheet {
                owner,
                prefix: prefix.clone(),
            }),
        );

        tracing::debug!(owner, prefix = %prefix, "attach stylesheet");
        let sink = registry().sink.read().clone();
        if let Some(sink) = sink {
            sink.attach(owner, &prefix, &css);
        }
        true
    }

    pub fn is_registered<W: 'static>() -> bool {
        registry().sheets.lock().contains_key(&TypeId::of::<W>())
    }

    /// Install the receiver of future stylesheets.
    pub fn set_sink(sink: Option<Arc<dyn StyleSink>>) {
        *registry().sink.write() = sink;
    }

    /// Detach every sheet and forget all registrations.
    pub fn clear() {
        let sheets: Vec<Sheet> = registry()
            .sheets
            .lock()
            .drain()
            .filter_map(|(_, sheet)| sheet)
            .collect();
        let sink = registry().sink.read().clone();
        if let Some(sink) = sink {
            for sheet in &sheets {
                sink.detach(sheet.owner, &sheet.prefix);
            }
        }
    }

    pub fn len() -> usize {
        registry().sheets.lock().len()
    }

    pub fn is_empty() -> bool {
        registry().sheets.lock().is_empty()
    }
}
