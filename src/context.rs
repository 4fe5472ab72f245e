//! Per-open parameter bag threaded through definitions, menus and events.
//!
//! A [`Context`] is a cheap handle: clones share the same underlying map. The
//! runtime reserves the keys in [`keys`]; feature code must not overwrite them.

use crate::error::MenuError;
use crate::service::MenuService;
use crate::session::MenuSession;
use crate::types::{DefinitionTag, UserId};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Reserved context keys.
pub mod keys {
    pub const USER: &str = "user";
    pub const SERVICE: &str = "menu-service";
    pub const DEFINITION: &str = "menu-definition";
    pub const PREVIOUS_SESSION: &str = "previous-session";
    pub const BACK_BUTTON_SLOT: &str = "back-button-slot";
    pub const CLOSE_BUTTON_SLOT: &str = "close-button-slot";
}

type Value = Arc<dyn Any + Send + Sync>;

/// Shared, mutable key/value store.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing whatever was there.
    pub fn put<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.values.lock().insert(key.into(), Arc::new(value));
    }

    /// Typed lookup; `None` when absent or of a different type.
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        self.get_arc::<T>(key).map(|value| (*value).clone())
    }

    /// Typed lookup without cloning the stored value.
    pub fn get_arc<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.values.lock().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Typed lookup that treats absence as a construction error.
    pub fn require<T: Any + Send + Sync + Clone>(&self, key: &str) -> Result<T, MenuError> {
        self.get::<T>(key)
            .ok_or_else(|| MenuError::MissingContextValue(key.to_string()))
    }

    pub fn remove(&self, key: &str) -> bool {
        self.values.lock().remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }

    pub fn clear(&self) {
        self.values.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// True when both handles share the same store.
    pub fn same_store(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    pub fn user(&self) -> Option<UserId> {
        self.get::<UserId>(keys::USER)
    }

    pub fn require_user(&self) -> Result<UserId, MenuError> {
        self.require::<UserId>(keys::USER)
    }

    pub fn set_user(&self, user: UserId) {
        self.put(keys::USER, user);
    }

    /// The service that opened this menu, if it is still alive.
    pub fn service(&self) -> Option<Arc<MenuService>> {
        self.get::<Weak<MenuService>>(keys::SERVICE)?.upgrade()
    }

    pub fn require_service(&self) -> Result<Arc<MenuService>, MenuError> {
        self.service()
            .ok_or_else(|| MenuError::MissingContextValue(keys::SERVICE.to_string()))
    }

    pub(crate) fn set_service(&self, service: Weak<MenuService>) {
        self.put(keys::SERVICE, service);
    }

    pub fn definition_tag(&self) -> Option<DefinitionTag> {
        self.get::<DefinitionTag>(keys::DEFINITION)
    }

    pub fn set_definition_tag(&self, tag: DefinitionTag) {
        self.put(keys::DEFINITION, tag);
    }

    pub fn previous_session(&self) -> Option<Arc<MenuSession>> {
        self.get::<Arc<MenuSession>>(keys::PREVIOUS_SESSION)
    }

    pub(crate) fn set_previous_session(&self, session: Arc<MenuSession>) {
        self.put(keys::PREVIOUS_SESSION, session);
    }

    pub fn back_button_slot(&self) -> Option<usize> {
        self.get::<usize>(keys::BACK_BUTTON_SLOT)
    }

    pub(crate) fn set_back_button_slot(&self, slot: usize) {
        self.put(keys::BACK_BUTTON_SLOT, slot);
    }

    pub fn close_button_slot(&self) -> Option<usize> {
        self.get::<usize>(keys::CLOSE_BUTTON_SLOT)
    }

    pub(crate) fn set_close_button_slot(&self, slot: usize) {
        self.put(keys::CLOSE_BUTTON_SLOT, slot);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("keys", &self.keys()).finish()
    }
}
