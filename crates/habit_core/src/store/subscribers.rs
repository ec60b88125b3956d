//! Subscriber registry keyed by caller-supplied identifiers.
//!
//! # Invariants
//! - At most one active handler per subscriber id (last registration wins).
//! - Every registration gets a fresh token, so a replaced or removed handler
//!   can be told apart from the one currently registered.

use crate::store::event::StoreNotification;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Subscriber callback.
pub type Handler = Arc<dyn Fn(&StoreNotification) + Send + Sync>;

struct Registration {
    token: u64,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_token: u64,
    entries: BTreeMap<String, Registration>,
}

/// Handle to the store's subscriber registry.
///
/// Cloning shares the same registry; the presentation layer receives one of
/// these from `HabitStore::subscriptions`.
#[derive(Clone, Default)]
pub struct Subscriptions {
    registry: Arc<Mutex<Registry>>,
}

/// Handler bound at publish time, re-checked at dispatch time.
#[derive(Clone)]
pub(crate) struct BoundHandler {
    pub(crate) subscriber_id: String,
    token: u64,
    handler: Handler,
}

impl BoundHandler {
    pub(crate) fn call(&self, notification: &StoreNotification) {
        (self.handler)(notification);
    }
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `subscriber_id`.
    ///
    /// Returns `true` when an earlier handler for the same id was replaced.
    pub fn subscribe<F>(&self, subscriber_id: impl Into<String>, handler: F) -> bool
    where
        F: Fn(&StoreNotification) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let token = registry.next_token;
        registry.next_token += 1;
        registry
            .entries
            .insert(
                subscriber_id.into(),
                Registration {
                    token,
                    handler: Arc::new(handler),
                },
            )
            .is_some()
    }

    /// Removes the handler for `subscriber_id`. Returns whether one existed.
    pub fn unsubscribe(&self, subscriber_id: &str) -> bool {
        self.registry.lock().entries.remove(subscriber_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.lock().entries.is_empty()
    }

    /// Returns sorted subscriber ids.
    pub fn subscriber_ids(&self) -> Vec<String> {
        self.registry.lock().entries.keys().cloned().collect()
    }

    pub(crate) fn bind_current(&self) -> Vec<BoundHandler> {
        self.registry
            .lock()
            .entries
            .iter()
            .map(|(subscriber_id, registration)| BoundHandler {
                subscriber_id: subscriber_id.clone(),
                token: registration.token,
                handler: Arc::clone(&registration.handler),
            })
            .collect()
    }

    pub(crate) fn is_still_registered(&self, bound: &BoundHandler) -> bool {
        self.registry
            .lock()
            .entries
            .get(bound.subscriber_id.as_str())
            .is_some_and(|registration| registration.token == bound.token)
    }
}
