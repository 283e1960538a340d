//! Request-private service registry.
//!
//! A [`ServiceRegistry`] maps a [`Key`] (a runtime type identity or an explicit
//! name) to one boxed value. The pipeline creates a fresh registry for every
//! dispatched request, so concurrent requests never share a slot.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::RegistryError;

/// Identity of a registry slot.
#[derive(Debug, Clone)]
pub enum Key {
    /// Slot keyed by the value's type
    Type {
        /// Type identity
        id: TypeId,
        /// Type name, for diagnostics only
        name: &'static str,
    },
    /// Slot keyed by an explicit name
    Named(String),
}

impl Key {
    /// The type-derived key for `T`.
    pub fn of<T: Any>() -> Self {
        Key::Type {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// A named key.
    pub fn named(name: impl Into<String>) -> Self {
        Key::Named(name.into())
    }
}

// Type names are not guaranteed unique, only the `TypeId` takes part in equality.
impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type { id: a, .. }, Key::Type { id: b, .. }) => a == b,
            (Key::Named(a), Key::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Type { id, .. } => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Named(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Type { name, .. } => write!(f, "type `{name}`"),
            Key::Named(name) => write!(f, "name '{name}'"),
        }
    }
}

/// A registered value together with its concrete type identity.
pub struct Entry {
    value: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Entry {
    /// Boxes `value`, remembering its concrete type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Type identity of the stored value.
    ///
    /// Not [`Any::type_id`], which identifies the `Entry` itself.
    pub fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the stored value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the stored value as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub(crate) fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self.value.as_ref()
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Mapping from [`Key`] to a single live value.
///
/// - `set` overwrites and hands back the previous entry.
/// - `get` fails with [`RegistryError::NotFound`] when the slot is empty.
/// - `delete` is idempotent: deleting an empty slot is a no-op that
///   returns `false`.
///
/// The registry is not synchronized. It is meant to be owned by one request
/// and mutated only through `&mut` borrows along that request's guard chain.
///
/// # Examples
///
/// ```
/// use guard_chain::ServiceRegistry;
///
/// let mut registry = ServiceRegistry::new();
/// registry.set(42u32);
/// assert_eq!(*registry.get::<u32>().unwrap(), 42);
///
/// assert!(registry.delete::<u32>());
/// assert!(!registry.delete::<u32>());
/// assert!(registry.get::<u32>().is_err());
/// ```
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: HashMap<Key, Entry>,
}

impl ServiceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` under its type, replacing any previous value of that type.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) -> Option<Entry> {
        self.insert_entry(Key::of::<T>(), Entry::new(value))
    }

    /// Registers `value` under an explicit name.
    pub fn set_named<T: Any + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: T,
    ) -> Option<Entry> {
        self.insert_entry(Key::named(name), Entry::new(value))
    }

    /// Returns the value registered under the type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no value of that type is registered.
    pub fn get<T: Any>(&self) -> Result<&T, RegistryError> {
        let key = Key::of::<T>();
        let entry = self.entry(&key).ok_or_else(|| RegistryError::NotFound {
            key: key.to_string(),
        })?;
        entry
            .downcast_ref::<T>()
            .ok_or_else(|| RegistryError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Returns the value registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if the slot is empty, or
    /// [`RegistryError::TypeMismatch`] if it holds something other than `T`.
    pub fn get_named<T: Any>(&self, name: &str) -> Result<&T, RegistryError> {
        let key = Key::named(name);
        let entry = self.entry(&key).ok_or_else(|| RegistryError::NotFound {
            key: key.to_string(),
        })?;
        entry
            .downcast_ref::<T>()
            .ok_or_else(|| RegistryError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Removes the value registered under the type `T`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn delete<T: Any>(&mut self) -> bool {
        self.remove_entry(&Key::of::<T>()).is_some()
    }

    /// Removes the value registered under `name`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn delete_named(&mut self, name: &str) -> bool {
        self.remove_entry(&Key::named(name)).is_some()
    }

    /// Returns `true` if `key` has a live entry.
    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Borrows the raw entry stored under `key`.
    pub fn entry(&self, key: &Key) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Inserts an entry, returning the one it replaced.
    pub fn insert_entry(&mut self, key: Key, entry: Entry) -> Option<Entry> {
        self.entries.insert(key, entry)
    }

    /// Removes and returns the entry stored under `key`.
    pub fn remove_entry(&mut self, key: &Key) -> Option<Entry> {
        self.entries.remove(key)
    }

    /// Iterates over live keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.keys()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct HomeId(u64);

    #[test]
    fn set_overwrites_previous_value() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.set(HomeId(1)).is_none());

        let previous = registry.set(HomeId(2)).expect("first value replaced");
        assert_eq!(previous.downcast_ref::<HomeId>(), Some(&HomeId(1)));
        assert_eq!(registry.get::<HomeId>().unwrap(), &HomeId(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn entry_reports_stored_value_type() {
        let mut registry = ServiceRegistry::new();
        registry.set(HomeId(3));

        let found = [Key::of::<HomeId>()]
            .iter()
            .filter_map(|key| registry.entry(key))
            .find(|entry| entry.value_type_id() == TypeId::of::<HomeId>());
        assert!(found.is_some());
        assert!(found.unwrap().type_name().ends_with("HomeId"));
    }

    #[test]
    fn get_missing_type_is_not_found() {
        let registry = ServiceRegistry::new();
        let err = registry.get::<HomeId>().unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        assert!(err.to_string().contains("HomeId"));
    }

    #[test]
    fn named_slots_are_independent_of_type_slots() {
        let mut registry = ServiceRegistry::new();
        registry.set_named("home", HomeId(7));

        assert!(registry.get::<HomeId>().is_err());
        assert_eq!(registry.get_named::<HomeId>("home").unwrap(), &HomeId(7));
    }

    #[test]
    fn named_slot_with_wrong_type_is_mismatch() {
        let mut registry = ServiceRegistry::new();
        registry.set_named("home", "not a home id".to_string());

        let err = registry.get_named::<HomeId>("home").unwrap_err();
        assert!(matches!(err, RegistryError::TypeMismatch { .. }));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut registry = ServiceRegistry::new();
        registry.set(HomeId(3));

        assert!(registry.delete::<HomeId>());
        assert!(!registry.delete::<HomeId>());
        assert!(!registry.delete_named("absent"));
        assert!(registry.is_empty());
    }

    #[test]
    fn type_keys_compare_by_type_id_only() {
        assert_eq!(Key::of::<HomeId>(), Key::of::<HomeId>());
        assert_ne!(Key::of::<HomeId>(), Key::of::<u64>());
        assert_ne!(Key::named("HomeId"), Key::of::<HomeId>());
    }
}
