//! Gridmenu: Interactive Grid Menu Runtime
//!
//! Declarative menu definitions are registered with a [`MenuService`], which
//! materializes them into live, per-user menus wrapped in navigable sessions.
//! Clicks and closes flow through a typed, priority-ordered event registry.

pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod events;
pub mod logging;
pub mod menu;
pub mod render;
pub mod service;
pub mod session;
pub mod types;
pub mod visual;

pub use config::{FillPolicy, MenuConfig};
pub use context::Context;
pub use definition::{ContentProvider, DefinitionSpec, MenuDefinition, PagedDefinition, StaticDefinition, StaticPage};
pub use error::MenuError;
pub use events::{ClickEvent, CloseEvent, EventManager, HandlerOptions, Listener, MenuEvent, OpenEvent};
pub use menu::{ClickOutcome, Menu, MenuItem, PageableMenu, RawClick, SimpleMenu};
pub use render::{MemoryRenderer, Renderer, Scheduler, TickScheduler};
pub use service::MenuService;
pub use session::{MenuSession, OpenOutcome, OpenResult, Opened};
pub use types::{DefinitionTag, UserId};
pub use visual::{ClickKind, PaneColor, Visual};
