//! Persisted analytics preferences.
//!
//! Session counters, install metadata, the user identifier, and the
//! debug flag survive process restarts through an external key-value
//! collaborator. The contract is a flat get/set of strings; no schema
//! versioning.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

const KEY_SESSION_COUNT: &str = "analytics.session_count";
const KEY_INSTALL_VERSION: &str = "analytics.install_version";
const KEY_INSTALL_BUILD: &str = "analytics.install_build";
const KEY_INSTALLED_AT: &str = "analytics.installed_at";
const KEY_USER_ID: &str = "analytics.user_id";
const KEY_DEBUG_MODE: &str = "analytics.debug_mode";

/// The flat persistence contract consumed by the core.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-process store for tests and hosts without persistent storage.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }
}

/// A shared store can be handed to the core while the host keeps its
/// own handle.
impl<T: KeyValueStore> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }
}

/// Typed view over the key-value store for the session state the
/// dispatcher owns.
pub struct SessionPrefs {
    store: Box<dyn KeyValueStore>,
}

impl SessionPrefs {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Monotonically increasing session counter. Zero means this
    /// install has never started a session.
    pub fn session_count(&self) -> u64 {
        self.store
            .get(KEY_SESSION_COUNT)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_session_count(&self, count: u64) {
        self.store.set(KEY_SESSION_COUNT, &count.to_string());
    }

    pub fn install_version(&self) -> Option<String> {
        self.store.get(KEY_INSTALL_VERSION)
    }

    pub fn set_install_version(&self, version: &str) {
        self.store.set(KEY_INSTALL_VERSION, version);
    }

    /// Platform build number the install shipped with, when the host
    /// exposed one.
    pub fn install_build(&self) -> Option<String> {
        self.store.get(KEY_INSTALL_BUILD)
    }

    pub fn set_install_build(&self, build_number: &str) {
        self.store.set(KEY_INSTALL_BUILD, build_number);
    }

    pub fn installed_at(&self) -> Option<DateTime<Utc>> {
        self.store
            .get(KEY_INSTALLED_AT)
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_installed_at(&self, at: DateTime<Utc>) {
        self.store.set(KEY_INSTALLED_AT, &at.to_rfc3339());
    }

    pub fn user_id(&self) -> Option<String> {
        self.store.get(KEY_USER_ID).filter(|v| !v.is_empty())
    }

    pub fn set_user_id(&self, user_id: &str) {
        self.store.set(KEY_USER_ID, user_id);
    }

    pub fn debug_mode(&self) -> bool {
        self.store
            .get(KEY_DEBUG_MODE)
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    pub fn set_debug_mode(&self, debug: bool) {
        self.store
            .set(KEY_DEBUG_MODE, if debug { "true" } else { "false" });
    }
}
