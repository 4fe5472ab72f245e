//! Menu events and the listener registry that dispatches them.

pub mod manager;
pub mod types;

pub use manager::{DispatchSummary, EventManager, HandlerOptions, HandlerResult, Listener};
pub use types::{ClickEvent, CloseEvent, EventBase, MenuEvent, OpenEvent};
