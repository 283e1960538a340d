//! Scoped injection sessions.
//!
//! An [`InjectionSession`] borrows a registry mutably, inserts a batch of
//! values, and takes them out again when it is released or dropped. Because
//! the session holds the only `&mut` to the registry, nested sessions must be
//! opened through [`InjectionSession::scope_mut`] and are torn down before
//! their parent: the borrow checker enforces the stack discipline.

use std::any::Any;

use crate::registry::{Entry, Key, ServiceRegistry};

/// Values a guard wants visible to the rest of the chain.
///
/// # Examples
///
/// ```
/// use guard_chain::{Injections, RightsLevel};
///
/// let injections = Injections::new()
///     .typed(RightsLevel::Admin)
///     .named("home_label", "Cottage".to_string());
/// assert_eq!(injections.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Injections {
    items: Vec<(Key, Entry)>,
}

impl Injections {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value keyed by its type.
    pub fn typed<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.items.push((Key::of::<T>(), Entry::new(value)));
        self
    }

    /// Adds a value keyed by `name`.
    pub fn named<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.items.push((Key::named(name), Entry::new(value)));
        self
    }

    /// Number of values in the batch, duplicates included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A live set of registrations owned by one guard invocation.
///
/// On open, every injected value is written into the registry. Duplicate keys
/// inside one batch collapse to a single slot (last write wins). On release,
/// each distinct key is handled once, in reverse insertion order: if the
/// session overwrote an existing entry, that entry is put back; otherwise the
/// slot is deleted. A session therefore never removes a value it did not put
/// there.
///
/// Release happens exactly once: either through [`release`](Self::release) or
/// when the session is dropped. Dropping covers early returns, `?` propagation,
/// panics and futures cancelled mid-await.
///
/// # Examples
///
/// ```
/// use guard_chain::{InjectionSession, Injections, RightsLevel, ServiceRegistry};
///
/// let mut registry = ServiceRegistry::new();
/// {
///     let session = InjectionSession::open(&mut registry, Injections::new().typed(RightsLevel::Admin));
///     assert_eq!(*session.scope().get::<RightsLevel>().unwrap(), RightsLevel::Admin);
/// }
/// assert!(registry.is_empty());
/// ```
#[derive(Debug)]
pub struct InjectionSession<'r> {
    scope: &'r mut ServiceRegistry,
    // Each distinct key with the entry it shadowed, in insertion order
    owned: Vec<(Key, Option<Entry>)>,
    released: bool,
}

impl<'r> InjectionSession<'r> {
    /// Inserts `injections` into `scope` and returns the session owning them.
    pub fn open(scope: &'r mut ServiceRegistry, injections: Injections) -> Self {
        let mut owned: Vec<(Key, Option<Entry>)> = Vec::with_capacity(injections.len());

        for (key, entry) in injections.items {
            let shadowed = scope.insert_entry(key.clone(), entry);
            // A repeat within this batch only displaces our own earlier value.
            if !owned.iter().any(|(k, _)| *k == key) {
                owned.push((key, shadowed));
            }
        }

        tracing::debug!(keys = owned.len(), "injection session opened");

        Self {
            scope,
            owned,
            released: false,
        }
    }

    /// Read access to the registry, including this session's values.
    pub fn scope(&self) -> &ServiceRegistry {
        &*self.scope
    }

    /// Mutable access to the registry, used to open nested sessions.
    pub fn scope_mut(&mut self) -> &mut ServiceRegistry {
        &mut *self.scope
    }

    /// Keys this session inserted, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.owned.iter().map(|(key, _)| key)
    }

    /// Removes this session's values from the registry.
    pub fn release(mut self) {
        self.release_owned();
    }

    fn release_owned(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let count = self.owned.len();
        for (key, shadowed) in self.owned.drain(..).rev() {
            match shadowed {
                Some(previous) => {
                    self.scope.insert_entry(key, previous);
                }
                None => {
                    self.scope.remove_entry(&key);
                }
            }
        }

        tracing::debug!(keys = count, "injection session released");
    }
}

impl Drop for InjectionSession<'_> {
    fn drop(&mut self) {
        self.release_owned();
    }
}
