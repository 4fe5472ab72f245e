//! Menu registry and the service facade feature code talks to.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::MenuConfig;
use crate::context::Context;
use crate::definition::MenuDefinition;
use crate::error::MenuError;
use crate::events::{EventManager, Listener};
use crate::menu::MenuEnv;
use crate::render::{Renderer, Scheduler};
use crate::session::MenuSession;
use crate::types::{DefinitionTag, UserId};

/// Definitions keyed by id.
#[derive(Default)]
pub struct MenuDefinitionStore {
    definitions: RwLock<HashMap<String, Arc<dyn MenuDefinition>>>,
}

impl MenuDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `definition`, returning whatever was registered under its id.
    pub fn put(&self, definition: Arc<dyn MenuDefinition>) -> Option<Arc<dyn MenuDefinition>> {
        self.definitions
            .write()
            .insert(definition.id().to_string(), definition)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MenuDefinition>> {
        self.definitions.read().get(id).cloned()
    }

    pub fn get_or_error(&self, id: &str) -> Result<Arc<dyn MenuDefinition>, MenuError> {
        self.get(id)
            .ok_or_else(|| MenuError::NotRegistered(id.to_string()))
    }

    pub fn remove(&self, id: &str) -> Option<Arc<dyn MenuDefinition>> {
        self.definitions.write().remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.read().contains_key(id)
    }

    pub fn clear(&self) {
        self.definitions.write().clear();
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.definitions.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// Entry point for feature code: registers definitions and opens menus.
///
/// One service owns one [`EventManager`]; build it once at startup and call
/// [`shutdown`](MenuService::shutdown) when the host unloads.
pub struct MenuService {
    store: MenuDefinitionStore,
    env: MenuEnv,
    this: Weak<MenuService>,
}

impl MenuService {
    pub fn new(renderer: Arc<dyn Renderer>, scheduler: Arc<dyn Scheduler>, config: MenuConfig) -> Arc<Self> {
        Self::with_env(MenuEnv::new(
            renderer,
            scheduler,
            Arc::new(EventManager::new()),
            config,
        ))
    }

    pub fn with_env(env: MenuEnv) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            store: MenuDefinitionStore::new(),
            env,
            this: this.clone(),
        })
    }

    pub fn env(&self) -> &MenuEnv {
        &self.env
    }

    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.env.events
    }

    pub fn config(&self) -> &MenuConfig {
        &self.env.config
    }

    /// Store `definition` and register its handlers under its id. A definition
    /// already registered under the same id is replaced along with its handlers.
    pub fn register_menu(&self, definition: Arc<dyn MenuDefinition>) {
        let tag = DefinitionTag::new(definition.id());
        self.env.events.unregister_listener(&tag);

        let mut listener = Listener::new(tag.clone());
        definition.register_handlers(&mut listener);
        if !listener.is_empty() {
            self.env.events.register_listener(&listener);
        }

        if self.store.put(definition).is_some() {
            warn!(menu = %tag, "Replaced existing menu definition");
        }
        info!(menu = %tag, handlers = listener.handler_count(), "Registered menu");
    }

    pub fn register_menus(&self, definitions: impl IntoIterator<Item = Arc<dyn MenuDefinition>>) {
        for definition in definitions {
            self.register_menu(definition);
        }
    }

    pub fn unregister_menu(&self, id: &str) -> Option<Arc<dyn MenuDefinition>> {
        let removed = self.store.remove(id)?;
        self.env.events.unregister_listener(&DefinitionTag::new(id));
        info!(menu = %id, "Unregistered menu");
        Some(removed)
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    pub fn menu_ids(&self) -> Vec<String> {
        self.store.ids()
    }

    /// Create and open a menu from the definition registered under `id`.
    ///
    /// `context` is stamped with the acting user, this service, the definition
    /// tag and, when `current` is given, the session to go back to. The
    /// returned session is linked to `current`.
    pub fn open_menu(
        &self,
        user: &UserId,
        id: &str,
        context: Context,
        current: Option<&Arc<MenuSession>>,
    ) -> Result<Arc<MenuSession>, MenuError> {
        let definition = self.store.get_or_error(id)?;

        context.set_user(user.clone());
        context.set_service(self.this.clone());
        context.set_definition_tag(DefinitionTag::new(id));
        if let Some(current) = current {
            context.set_previous_session(current.clone());
        }

        let menu = definition.create(&context)?;
        let session = MenuSession::with_previous(
            menu,
            user.clone(),
            context,
            self.env.events.clone(),
            current.cloned(),
        )?;
        debug!(menu = %id, user = %user, session = %session.id(), "Opening menu");
        session.open();
        Ok(session)
    }

    /// [`open_menu`](Self::open_menu), reporting a failure to the user
    /// instead of returning it.
    pub fn open_menu_or_notify(
        &self,
        user: &UserId,
        id: &str,
        context: Context,
        current: Option<&Arc<MenuSession>>,
    ) -> Option<Arc<MenuSession>> {
        match self.open_menu(user, id, context, current) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(menu = %id, user = %user, error = %err, "Failed to open menu");
                self.env.renderer.send_message(user, &err.user_message(id));
                None
            }
        }
    }

    /// Drop every definition and handler.
    pub fn shutdown(&self) {
        self.store.clear();
        self.env.events.clear();
        info!("Menu service shut down");
    }
}
