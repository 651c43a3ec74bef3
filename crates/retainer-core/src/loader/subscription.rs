//! Subscription - scoped observer attachment.

use std::rc::Weak;

use super::machine::Shared;

/// Returned by [`Loader::observe`](super::Loader::observe).
///
/// Dropping it detaches the observer, unless another observer has replaced it
/// in the meantime.
#[must_use = "dropping a Subscription detaches the observer immediately"]
pub struct Subscription<T: 'static> {
    shared: Weak<Shared<T>>,
    id: u64,
}

impl<T: 'static> Subscription<T> {
    pub(crate) fn new(shared: Weak<Shared<T>>, id: u64) -> Self {
        Self { shared, id }
    }

    /// Is this subscription's observer still the attached one?
    pub fn is_current(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.core.borrow().observer_id() == Some(self.id))
    }

    /// Detach now. Same as dropping.
    pub fn unsubscribe(self) {}
}

impl<T: 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.detach_if_current(self.id);
        }
    }
}
