//! Process-wide registry of component widget types.

use std::any::{Any, TypeId};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use dashmap::DashMap;

type Equality = fn(&dyn Any, &dyn Any) -> bool;

#[derive(Debug, Clone)]
struct TypeEntry {
    name: &'static str,
    prefix: String,
    equality: Option<Equality>,
}

static TYPES: OnceLock<DashMap<TypeId, TypeEntry>> = OnceLock::new();

fn types() -> &'static DashMap<TypeId, TypeEntry> {
    TYPES.get_or_init(DashMap::new)
}

fn style_prefix(name: &str) -> String {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    format!("w{:08x}", hasher.finish() as u32)
}

fn equal_values<W: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<W>(), b.downcast_ref::<W>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Per-type facts about component widgets: a readable name, the CSS scope
/// prefix of the type, and whether two instances can be compared by value.
pub struct WidgetTypes;

impl WidgetTypes {
    /// Register `W` if needed and return its style prefix.
    pub fn register<W: 'static>() -> String {
        let name = std::any::type_name::<W>();
        types()
            .entry(TypeId::of::<W>())
            .or_insert_with(|| {
                tracing::debug!(widget = name, "register widget type");
                TypeEntry {
                    name,
                    prefix: style_prefix(name),
                    equality: None,
                }
            })
            .prefix
            .clone()
    }

    /// The style prefix of `W`, if it was registered.
    pub fn prefix<W: 'static>() -> Option<String> {
        types()
            .get(&TypeId::of::<W>())
            .map(|entry| entry.prefix.clone())
    }

    /// Let instances of `W` skip rebuilds when the new widget equals the old.
    pub fn register_value_equality<W: PartialEq + 'static>() {
        Self::register::<W>();
        if let Some(mut entry) = types().get_mut(&TypeId::of::<W>()) {
            entry.equality = Some(equal_values::<W>);
        }
    }

    /// Whether the type registered a value equality.
    pub fn supports_value_equality(type_id: TypeId) -> bool {
        types()
            .get(&type_id)
            .is_some_and(|entry| entry.equality.is_some())
    }

    /// Compare two widgets with the equality registered for their type.
    /// Types without one are never equal.
    pub fn values_equal(a: &dyn Any, b: &dyn Any) -> bool {
        let type_id = a.type_id();
        if type_id != b.type_id() {
            return false;
        }
        // Copy the fn out so no shard lock is held while user code runs.
        let equality = types().get(&type_id).and_then(|entry| entry.equality);
        equality.is_some_and(|equal| equal(a, b))
    }

    /// The type name recorded at registration.
    pub fn name_of(type_id: TypeId) -> Option<&'static str> {
        types().get(&type_id).map(|entry| entry.name)
    }

    /// Number of registered types.
    pub fn len() -> usize {
        types().len()
    }

    /// Whether no type is registered.
    pub fn is_empty() -> bool {
        types().is_empty()
    }

    /// Forget every registration.
    pub fn clear() {
        types().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq)]
    struct Label(&'static str);

    struct Opaque;

    #[test]
    fn prefix_is_stable() {
        let prefix = WidgetTypes::register::<Opaque>();
        assert_eq!(WidgetTypes::register::<Opaque>(), prefix);
        assert_eq!(WidgetTypes::prefix::<Opaque>(), Some(prefix.clone()));
        assert!(prefix.starts_with('w'));
        assert_eq!(
            WidgetTypes::name_of(TypeId::of::<Opaque>()),
            Some(std::any::type_name::<Opaque>())
        );
    }

    #[test]
    fn value_equality_is_opt_in() {
        assert!(!WidgetTypes::values_equal(&Opaque, &Opaque));

        WidgetTypes::register_value_equality::<Label>();
        assert!(WidgetTypes::supports_value_equality(TypeId::of::<Label>()));
        assert!(WidgetTypes::values_equal(&Label("a"), &Label("a")));
        assert!(!WidgetTypes::values_equal(&Label("a"), &Label("b")));
        assert!(!WidgetTypes::values_equal(&Label("a"), &Opaque));
    }
}
