//! LoaderManager - the loaders of one scope, by key.
//!
//! Design:
//! - Loaders are created only through [`LoaderManager::get_or_create`].
//! - One observer per loader: a second `get_or_create` on an observed loader
//!   is a bug at the call site and is reported.
//! - Teardown is one call, chosen by whether the scope comes back:
//!   [`detach_all`](LoaderManager::detach_all) or
//!   [`destroy_all`](LoaderManager::destroy_all).
//!
//! The manager is usually kept in a [`RetainState`] so its loaders survive a
//! transient teardown.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::domain::LoaderStatus;
use crate::error::LoaderError;
use crate::loader::Loader;
use crate::ports::{Dispatcher, Load, Observer};
use crate::retain::RetainState;

/// Type-erased view of a `Loader<T>` so loaders of different result types
/// can share one map.
trait ManagedLoader {
    fn as_any(&self) -> &dyn Any;
    fn detach(&self);
    fn destroy(&self) -> Result<(), LoaderError>;
    fn is_destroyed(&self) -> bool;
    fn status(&self) -> LoaderStatus;
}

impl<T: 'static> ManagedLoader for Loader<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn detach(&self) {
        // Detaching never fails.
        let _ = self.set_observer(None);
    }

    fn destroy(&self) -> Result<(), LoaderError> {
        Loader::destroy(self)
    }

    fn is_destroyed(&self) -> bool {
        Loader::is_destroyed(self)
    }

    fn status(&self) -> LoaderStatus {
        Loader::status(self)
    }
}

/// Keyed registry of loaders scoped to one owner.
pub struct LoaderManager {
    loaders: RefCell<HashMap<u32, Rc<dyn ManagedLoader>>>,
    dispatcher: Rc<dyn Dispatcher>,
}

impl LoaderManager {
    /// Loaders created by this manager defer callbacks through `dispatcher`.
    pub fn new(dispatcher: Rc<dyn Dispatcher>) -> Self {
        Self {
            loaders: RefCell::new(HashMap::new()),
            dispatcher,
        }
    }

    /// Return the loader for `key`, creating it around `create()` if there is
    /// none, and attach `observer`.
    ///
    /// The observer immediately receives what the loader already has (see
    /// [`Loader::set_observer`]).
    ///
    /// # Errors
    /// - [`LoaderError::AlreadyObserved`] if the loader already has an observer.
    /// - [`LoaderError::TypeMismatch`] if `key` holds a loader of another type.
    /// - [`LoaderError::Destroyed`] if the caller destroyed the loader itself.
    pub fn get_or_create<T, L, F>(
        &self,
        key: u32,
        create: F,
        observer: Option<Rc<dyn Observer<T>>>,
    ) -> Result<Loader<T>, LoaderError>
    where
        T: 'static,
        L: Load<T> + 'static,
        F: FnOnce() -> L,
    {
        let loader = match self.get::<T>(key)? {
            Some(loader) => loader,
            None => {
                let loader = Loader::new(create(), Rc::clone(&self.dispatcher));
                let managed: Rc<dyn ManagedLoader> = Rc::new(loader.clone());
                self.loaders.borrow_mut().insert(key, managed);
                debug!(key, "loader created");
                loader
            }
        };

        if loader.is_attached() {
            let err = LoaderError::AlreadyObserved { key };
            warn!(key, label = err.as_label(), "loader already has an observer");
            return Err(err);
        }
        loader.set_observer(observer)?;
        Ok(loader)
    }

    /// The loader for `key`, if any.
    ///
    /// # Errors
    /// [`LoaderError::TypeMismatch`] if it has another result type.
    pub fn get<T: 'static>(&self, key: u32) -> Result<Option<Loader<T>>, LoaderError> {
        let loaders = self.loaders.borrow();
        let Some(managed) = loaders.get(&key) else {
            return Ok(None);
        };
        managed
            .as_any()
            .downcast_ref::<Loader<T>>()
            .cloned()
            .map(Some)
            .ok_or(LoaderError::TypeMismatch { key })
    }

    pub fn contains(&self, key: u32) -> bool {
        self.loaders.borrow().contains_key(&key)
    }

    /// Status of the loader under `key`, whatever its result type.
    pub fn status(&self, key: u32) -> Option<LoaderStatus> {
        let managed = self.loaders.borrow().get(&key).cloned()?;
        Some(managed.status())
    }

    /// Detach, destroy and forget the loader under `key`. Returns whether
    /// there was one.
    pub fn remove(&self, key: u32) -> bool {
        let Some(managed) = self.loaders.borrow_mut().remove(&key) else {
            return false;
        };
        managed.detach();
        if !managed.is_destroyed() {
            // Fails only on an already destroyed loader.
            let _ = managed.destroy();
        }
        debug!(key, "loader removed");
        true
    }

    /// Detach every observer; loaders keep running and keep their results.
    pub fn detach_all(&self) {
        let loaders: Vec<_> = self.loaders.borrow().values().cloned().collect();
        for managed in &loaders {
            managed.detach();
        }
        debug!(count = loaders.len(), "loaders detached");
    }

    /// Destroy every loader and empty the manager.
    pub fn destroy_all(&self) {
        let loaders = std::mem::take(&mut *self.loaders.borrow_mut());
        for managed in loaders.values() {
            if !managed.is_destroyed() {
                let _ = managed.destroy();
            }
        }
        debug!(count = loaders.len(), "loaders destroyed");
    }

    /// Scope teardown: detach if `state` is retaining (the scope comes back),
    /// destroy otherwise.
    pub fn on_scope_destroy(&self, state: &RetainState) {
        if state.is_retaining() {
            self.detach_all();
        } else {
            self.destroy_all();
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = u32> + use<> {
        let keys: Vec<_> = self.loaders.borrow().keys().copied().collect();
        keys.into_iter()
    }

    pub fn len(&self) -> usize {
        self.loaders.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.borrow().is_empty()
    }
}

impl fmt::Debug for LoaderManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderManager")
            .field("len", &self.len())
            .finish()
    }
}
