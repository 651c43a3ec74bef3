//! RetainState - keyed store of objects that survive scope recreation.
//!
//! A store may hold other stores. The `retaining` flag is pushed down through
//! that nesting, so any nested owner can answer "am I about to be thrown away
//! for good, or only suspended?" with a single check.
//!
//! # Lifecycle
//! ```text
//! RetainState::from_snapshot(host.take_snapshot())
//!     │
//!     ├─ retain_or_create / get / remove ...
//!     │
//!     ├─ transient teardown:  begin_retaining() ─► snapshot() ─► host
//!     └─ permanent teardown:  destroy()
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::RetainError;

/// Opaque contents of a [`RetainState`], handed to the host between scope
/// instances. Only good for feeding back into [`RetainState::from_snapshot`].
pub struct Snapshot {
    values: HashMap<u32, Rc<dyn Any>>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("len", &self.values.len())
            .finish()
    }
}

/// Keyed, heterogeneous store of retained values.
///
/// Values are shared `Rc`s; the store never clones or serializes them. A
/// value that is itself a `RetainState` is a nested store and follows its
/// parent's `retaining` flag.
pub struct RetainState {
    values: RefCell<HashMap<u32, Rc<dyn Any>>>,
    retaining: Cell<bool>,
}

impl RetainState {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            values: RefCell::new(HashMap::new()),
            retaining: Cell::new(false),
        }
    }

    /// Rebuild a store from the snapshot kept by the host, or start empty.
    ///
    /// The restored store, and every store nested in it, starts with
    /// `retaining == false`.
    pub fn from_snapshot(previous: Option<Snapshot>) -> Self {
        let Some(snapshot) = previous else {
            return Self::new();
        };
        debug!(len = snapshot.values.len(), "restoring retained state");
        let state = Self {
            values: RefCell::new(snapshot.values),
            retaining: Cell::new(false),
        };
        state.set_retaining(false);
        state
    }

    /// Return the value stored under `key`, creating it with `create` if the
    /// key is empty. `create` runs at most once per key.
    ///
    /// A freshly created nested store picks up this store's `retaining` flag.
    ///
    /// # Errors
    /// [`RetainError::TypeMismatch`] if `key` holds a value of another type.
    pub fn retain_or_create<V, F>(&self, key: u32, create: F) -> Result<Rc<V>, RetainError>
    where
        V: Any,
        F: FnOnce() -> V,
    {
        let existing = self.values.borrow().get(&key).cloned();
        if let Some(existing) = existing {
            return existing
                .downcast::<V>()
                .map_err(|_| RetainError::TypeMismatch { key });
        }

        // No borrow is held here: `create` may use this store.
        let value = Rc::new(create());
        let erased: Rc<dyn Any> = value.clone();
        if let Some(nested) = erased.downcast_ref::<RetainState>() {
            nested.set_retaining(self.retaining.get());
        }
        self.values.borrow_mut().insert(key, erased);
        debug!(key, "retained value created");
        Ok(value)
    }

    /// Look up `key`. `None` if absent or of another type.
    pub fn get<V: Any>(&self, key: u32) -> Option<Rc<V>> {
        let value = self.get_any(key)?;
        match value.downcast::<V>() {
            Ok(value) => Some(value),
            Err(_) => {
                trace!(key, "retained value has a different type");
                None
            }
        }
    }

    /// Look up `key` without a type.
    pub fn get_any(&self, key: u32) -> Option<Rc<dyn Any>> {
        self.values.borrow().get(&key).cloned()
    }

    pub fn contains(&self, key: u32) -> bool {
        self.values.borrow().contains_key(&key)
    }

    /// Remove `key`. A removed nested store stops retaining.
    pub fn remove(&self, key: u32) -> Option<Rc<dyn Any>> {
        let removed = self.values.borrow_mut().remove(&key)?;
        if let Some(nested) = removed.downcast_ref::<RetainState>() {
            nested.set_retaining(false);
        }
        debug!(key, "retained value removed");
        Some(removed)
    }

    /// Current values, collected when the call is made.
    pub fn values(&self) -> impl Iterator<Item = Rc<dyn Any>> + use<> {
        let values: Vec<_> = self.values.borrow().values().cloned().collect();
        values.into_iter()
    }

    /// Current keys, collected when the call is made.
    pub fn keys(&self) -> impl Iterator<Item = u32> + use<> {
        let keys: Vec<_> = self.values.borrow().keys().copied().collect();
        keys.into_iter()
    }

    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// Contents to hand to the host. The values are shared, not copied.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            values: self.values.borrow().clone(),
        }
    }

    /// Mark this store and every nested store as about to survive a
    /// recreation.
    pub fn begin_retaining(&self) {
        debug!(len = self.len(), "begin retaining");
        self.set_retaining(true);
    }

    pub fn is_retaining(&self) -> bool {
        self.retaining.get()
    }

    /// Permanent teardown: stop retaining, destroy nested stores, drop every
    /// value.
    pub fn destroy(&self) {
        self.retaining.set(false);
        let values = std::mem::take(&mut *self.values.borrow_mut());
        for value in values.values() {
            if let Some(nested) = value.downcast_ref::<RetainState>() {
                nested.destroy();
            }
        }
        debug!(len = values.len(), "retained state destroyed");
    }

    fn set_retaining(&self, retaining: bool) {
        self.retaining.set(retaining);
        for nested in self.nested() {
            nested.set_retaining(retaining);
        }
    }

    fn nested(&self) -> Vec<Rc<RetainState>> {
        self.values
            .borrow()
            .values()
            .filter_map(|value| Rc::clone(value).downcast::<RetainState>().ok())
            .collect()
    }
}

impl Default for RetainState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetainState")
            .field("len", &self.len())
            .field("retaining", &self.retaining.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retain_creates_object() {
        let state = RetainState::new();
        let value = state.retain_or_create(0, || "test".to_string()).unwrap();
        assert_eq!(*value, "test");
    }

    #[test]
    fn retain_returns_existing_object() {
        let state = RetainState::new();
        let first = state.retain_or_create(0, || "test".to_string()).unwrap();
        let second = state
            .retain_or_create::<String, _>(0, || panic!("create must not run for a retained key"))
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn retain_supports_multiple_keys() {
        let state = RetainState::new();
        let a = state.retain_or_create(0, || "test1".to_string()).unwrap();
        let b = state.retain_or_create(1, || "test2".to_string()).unwrap();
        assert_eq!(*a, "test1");
        assert_eq!(*b, "test2");
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn retain_rejects_other_type() {
        let state = RetainState::new();
        state.retain_or_create(0, || 1u8).unwrap();
        let err = state.retain_or_create(0, || "x".to_string()).unwrap_err();
        assert_eq!(err, RetainError::TypeMismatch { key: 0 });
    }

    #[test]
    fn get_missing_is_none() {
        let state = RetainState::new();
        assert!(state.get::<String>(0).is_none());
        assert!(!state.contains(0));
    }

    #[test]
    fn get_returns_retained_object() {
        let state = RetainState::new();
        state.retain_or_create(0, || "test".to_string()).unwrap();
        assert_eq!(state.get::<String>(0).as_deref(), Some(&"test".to_string()));
        assert!(state.get::<u32>(0).is_none());
    }

    #[test]
    fn remove_missing_is_none() {
        let state = RetainState::new();
        assert!(state.remove(0).is_none());
    }

    #[test]
    fn remove_returns_and_forgets() {
        let state = RetainState::new();
        state.retain_or_create(0, || "test".to_string()).unwrap();
        let removed = state.remove(0).unwrap();
        assert_eq!(removed.downcast_ref::<String>().map(String::as_str), Some("test"));
        assert!(state.get_any(0).is_none());
        assert!(state.is_empty());
    }

    #[test]
    fn snapshot_round_trip_keeps_identity() {
        let state = RetainState::new();
        let created = state.retain_or_create(0, || "test".to_string()).unwrap();
        let snapshot = state.snapshot();
        drop(state);

        let restored = RetainState::from_snapshot(Some(snapshot));
        let value = restored.get::<String>(0).unwrap();
        assert!(Rc::ptr_eq(&created, &value));
    }

    #[test]
    fn from_no_snapshot_is_empty() {
        let state = RetainState::from_snapshot(None);
        assert!(state.is_empty());
        assert!(!state.is_retaining());
    }

    #[test]
    fn begin_retaining_reaches_nested_stores() {
        let parent = RetainState::new();
        let child = parent.retain_or_create(0, RetainState::new).unwrap();
        let grandchild = child.retain_or_create(0, RetainState::new).unwrap();

        parent.begin_retaining();

        assert!(parent.is_retaining());
        assert!(child.is_retaining());
        assert!(grandchild.is_retaining());
    }

    #[test]
    fn nested_store_created_while_retaining_inherits_flag() {
        let parent = RetainState::new();
        parent.begin_retaining();
        let child = parent.retain_or_create(1, RetainState::new).unwrap();
        assert!(child.is_retaining());
    }

    #[test]
    fn restored_store_is_not_retaining() {
        let parent = RetainState::new();
        let child = parent.retain_or_create(0, RetainState::new).unwrap();
        parent.begin_retaining();

        let restored = RetainState::from_snapshot(Some(parent.snapshot()));

        assert!(!restored.is_retaining());
        assert!(!child.is_retaining());
        let child_again = restored.get::<RetainState>(0).unwrap();
        assert!(Rc::ptr_eq(&child, &child_again));
    }

    #[test]
    fn removed_nested_store_stops_retaining() {
        let parent = RetainState::new();
        let child = parent.retain_or_create(0, RetainState::new).unwrap();
        parent.begin_retaining();

        parent.remove(0).unwrap();

        assert!(parent.is_retaining());
        assert!(!child.is_retaining());
    }

    #[test]
    fn destroy_clears_tree() {
        let parent = RetainState::new();
        let child = parent.retain_or_create(0, RetainState::new).unwrap();
        child.retain_or_create(5, || 5u64).unwrap();
        parent.retain_or_create(1, || "x".to_string()).unwrap();
        parent.begin_retaining();

        parent.destroy();

        assert!(!parent.is_retaining());
        assert!(parent.is_empty());
        assert!(!child.is_retaining());
        assert!(child.is_empty());
    }

    #[test]
    fn values_iterate_over_current_entries() {
        let state = RetainState::new();
        state.retain_or_create(0, || 1u32).unwrap();
        state.retain_or_create(1, || 2u32).unwrap();

        let mut seen: Vec<u32> = state
            .values()
            .filter_map(|v| v.downcast_ref::<u32>().copied())
            .collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2]);

        let mut keys: Vec<u32> = state.keys().collect();
        keys.sort();
        assert_eq!(keys, vec![0, 1]);
    }

    #[test]
    fn create_may_use_the_same_store() {
        let state = Rc::new(RetainState::new());
        let inner = Rc::clone(&state);
        let value = state
            .retain_or_create(0, move || inner.len() + 10)
            .unwrap();
        assert_eq!(*value, 10);
    }
}
