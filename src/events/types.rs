//! Event schema: Open, Click and Close, plus the trait custom events implement.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::menu::{Menu, MenuItem};
use crate::session::MenuSession;
use crate::types::UserId;
use crate::visual::{ClickKind, Visual};

/// Fields every menu event carries.
#[derive(Clone)]
pub struct EventBase {
    user: UserId,
    menu: Arc<dyn Menu>,
    session: Arc<MenuSession>,
    context: Context,
    cancelled: bool,
}

impl EventBase {
    pub fn new(user: UserId, menu: Arc<dyn Menu>, session: Arc<MenuSession>, context: Context) -> Self {
        Self {
            user,
            menu,
            session,
            context,
            cancelled: false,
        }
    }

    /// Base for an event about `session`'s own menu.
    pub fn for_session(session: &Arc<MenuSession>) -> Self {
        Self::new(
            session.user().clone(),
            session.menu().clone(),
            session.clone(),
            session.context().clone(),
        )
    }
}

/// Anything that can travel through the [`EventManager`](crate::events::EventManager).
///
/// Handlers are keyed by the concrete event type, so custom events only need
/// to implement this trait.
pub trait MenuEvent: Any + Send {
    /// Name used in log output.
    const NAME: &'static str;

    fn base(&self) -> &EventBase;

    fn base_mut(&mut self) -> &mut EventBase;

    fn user(&self) -> &UserId {
        &self.base().user
    }

    fn menu(&self) -> &Arc<dyn Menu> {
        &self.base().menu
    }

    fn session(&self) -> &Arc<MenuSession> {
        &self.base().session
    }

    fn context(&self) -> &Context {
        &self.base().context
    }

    fn is_cancelled(&self) -> bool {
        self.base().cancelled
    }

    fn set_cancelled(&mut self, cancelled: bool) {
        self.base_mut().cancelled = cancelled;
    }

    fn cancel(&mut self) {
        self.set_cancelled(true);
    }
}

/// Fired by a session before its menu is shown.
#[derive(Clone)]
pub struct OpenEvent {
    base: EventBase,
}

impl OpenEvent {
    pub fn new(base: EventBase) -> Self {
        Self { base }
    }
}

impl MenuEvent for OpenEvent {
    const NAME: &'static str = "open";

    fn base(&self) -> &EventBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EventBase {
        &mut self.base
    }
}

/// Fired when the user clicks a cell that is not a framework-owned button.
#[derive(Clone)]
pub struct ClickEvent {
    base: EventBase,
    slot: usize,
    visual: Option<Visual>,
    item: Option<MenuItem>,
    kind: ClickKind,
}

impl ClickEvent {
    pub fn new(
        base: EventBase,
        slot: usize,
        visual: Option<Visual>,
        item: Option<MenuItem>,
        kind: ClickKind,
    ) -> Self {
        Self {
            base,
            slot,
            visual,
            item,
            kind,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// What the host reported under the cursor, if anything.
    pub fn visual(&self) -> Option<&Visual> {
        self.visual.as_ref()
    }

    /// The menu item at the clicked slot, if any.
    pub fn item(&self) -> Option<&MenuItem> {
        self.item.as_ref()
    }

    pub fn kind(&self) -> ClickKind {
        self.kind
    }
}

impl MenuEvent for ClickEvent {
    const NAME: &'static str = "click";

    fn base(&self) -> &EventBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EventBase {
        &mut self.base
    }
}

/// Fired when a menu is closed or about to be closed.
#[derive(Clone)]
pub struct CloseEvent {
    base: EventBase,
    silent: bool,
}

impl CloseEvent {
    pub fn new(base: EventBase, silent: bool) -> Self {
        Self { base, silent }
    }

    /// True when the close was programmatic rather than user-initiated.
    pub fn is_silent(&self) -> bool {
        self.silent
    }
}

impl MenuEvent for CloseEvent {
    const NAME: &'static str = "close";

    fn base(&self) -> &EventBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EventBase {
        &mut self.base
    }
}

impl fmt::Debug for EventBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBase")
            .field("user", &self.user)
            .field("session", &self.session.id())
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

impl fmt::Debug for OpenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenEvent").field("base", &self.base).finish()
    }
}
