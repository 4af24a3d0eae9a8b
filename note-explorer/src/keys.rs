use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

/// Window-level keys the explorer reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Delete the selection.
    Delete,
    /// Cancel the active edit, drag or menu.
    Escape,
}

/// Handle returned by [`KeySource::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Host-provided source of window key events.
///
/// The explorer subscribes once when keys are wired and unsubscribes on
/// teardown; it never installs implicit global handlers.
pub trait KeySource {
    /// Registers interest in `keys`.
    fn subscribe(&self, keys: &[Key]) -> SubscriptionId;
    /// Drops a registration. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Simple in-process [`KeySource`] registry.
///
/// Clones share the registry. The host calls [`WindowKeys::press`] for each
/// window key and forwards [`crate::ExplorerEvent::Key`] to every explorer whose
/// [`crate::Explorer::key_subscription`] is among the returned ids.
#[derive(Clone, Debug, Default)]
pub struct WindowKeys {
    registrations: Rc<RefCell<IndexMap<u64, Vec<Key>>>>,
    next_id: Rc<Cell<u64>>,
}

impl WindowKeys {
    /// Returns whether `id` is still registered.
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.registrations.borrow().contains_key(&id.0)
    }

    /// Delivers a key press: returns the subscriptions listening for `key`,
    /// in registration order.
    pub fn press(&self, key: Key) -> Vec<SubscriptionId> {
        self.registrations
            .borrow()
            .iter()
            .filter(|(_, keys)| keys.contains(&key))
            .map(|(id, _)| SubscriptionId(*id))
            .collect()
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.registrations.borrow().len()
    }

    /// Returns whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.borrow().is_empty()
    }
}

impl KeySource for WindowKeys {
    fn subscribe(&self, keys: &[Key]) -> SubscriptionId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.registrations.borrow_mut().insert(id, keys.to_vec());
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.registrations.borrow_mut().shift_remove(&id.0);
    }
}
