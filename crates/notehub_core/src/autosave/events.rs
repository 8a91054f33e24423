//! Autosave events and the registry that delivers them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use ts_rs::TS;

use super::state::SaveState;
use crate::types::VersionToken;

/// Something observable happened to the open document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum AutosaveEvent {
    StateChanged {
        path: Option<String>,
        state: SaveState,
    },
    Saved {
        path: String,
        version_token: VersionToken,
    },
    Conflict {
        path: String,
    },
    SaveFailed {
        path: String,
        message: String,
        retryable: bool,
    },
}

/// A unique identifier for a subscription.
pub type SubscriptionId = u64;

/// Callback function type for autosave events.
///
/// Callbacks run synchronously on the task that caused the event and
/// should not block.
pub type AutosaveCallback = Arc<dyn Fn(&AutosaveEvent) + Send + Sync>;

/// Thread-safe registry of event subscribers.
pub struct CallbackRegistry {
    callbacks: RwLock<HashMap<SubscriptionId, AutosaveCallback>>,
    next_id: AtomicU64,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns a subscription ID that can be used to unsubscribe later.
    pub fn subscribe(&self, callback: AutosaveCallback) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, callback);
        id
    }

    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }

    /// Emit an event to all registered callbacks.
    ///
    /// If a callback panics, it does not affect other callbacks.
    pub fn emit(&self, event: &AutosaveEvent) {
        let callbacks: Vec<AutosaveCallback> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();

        for callback in callbacks {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                callback(event);
            }));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("subscriber_count", &self.subscriber_count())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .finish()
    }
}
