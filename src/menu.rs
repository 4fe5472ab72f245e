//! Menu instances: slot contents, open/closed state and raw signal handling.

mod base;
pub mod decoration;
mod pageable;
mod simple;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MenuConfig;
use crate::events::EventManager;
use crate::render::{Renderer, Scheduler};
use crate::visual::{ClickKind, Visual};

pub use base::MenuCore;
pub use pageable::{PageableMenu, BACK_OFFSET, CLOSE_OFFSET, NEXT_OFFSET, PREVIOUS_OFFSET};
pub use simple::SimpleMenu;

/// Cells per row.
pub const ROW_SIZE: usize = 9;
/// Largest grid a surface can show.
pub const MAX_ROWS: usize = 6;

/// Collaborators every menu instance talks to.
#[derive(Clone)]
pub struct MenuEnv {
    pub renderer: Arc<dyn Renderer>,
    pub scheduler: Arc<dyn Scheduler>,
    pub events: Arc<EventManager>,
    pub config: Arc<MenuConfig>,
}

impl MenuEnv {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        scheduler: Arc<dyn Scheduler>,
        events: Arc<EventManager>,
        config: MenuConfig,
    ) -> Self {
        Self {
            renderer,
            scheduler,
            events,
            config: Arc::new(config),
        }
    }
}

/// One entry in a menu grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    slot: usize,
    visual: Visual,
    #[serde(default)]
    movable: bool,
}

impl MenuItem {
    /// A fixed item the user cannot take or move.
    pub fn new(slot: usize, visual: Visual) -> Self {
        Self {
            slot,
            visual,
            movable: false,
        }
    }

    pub fn movable(slot: usize, visual: Visual) -> Self {
        Self {
            slot,
            visual,
            movable: true,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn set_slot(&mut self, slot: usize) {
        self.slot = slot;
    }

    pub fn visual(&self) -> &Visual {
        &self.visual
    }

    pub fn set_visual(&mut self, visual: Visual) {
        self.visual = visual;
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn set_movable(&mut self, movable: bool) {
        self.movable = movable;
    }
}

/// A cell click as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClick {
    pub slot: usize,
    pub visual: Option<Visual>,
    pub kind: ClickKind,
}

impl RawClick {
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            visual: None,
            kind: ClickKind::Left,
        }
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn with_kind(mut self, kind: ClickKind) -> Self {
        self.kind = kind;
        self
    }
}

/// What the host should do with the interaction it reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Outside the menu grid; the host handles it as usual.
    Ignored,
    /// The host may let the item move.
    Allowed,
    /// The host must block the move or removal.
    Vetoed,
}

impl ClickOutcome {
    pub fn is_vetoed(self) -> bool {
        matches!(self, ClickOutcome::Vetoed)
    }
}

/// A live grid bound to one user.
///
/// State shared by every menu lives in [`MenuCore`]; implementations override
/// the lifecycle hooks they need and inherit the rest.
pub trait Menu: Send + Sync {
    fn core(&self) -> &MenuCore;

    fn open(&self) {
        self.core().open();
    }

    fn close(&self, silent: bool) {
        self.core().close(silent);
    }

    fn is_open(&self) -> bool {
        self.core().is_open()
    }

    /// Raw "cell clicked" signal from the renderer.
    fn handle_click(&self, click: RawClick) -> ClickOutcome {
        self.core().handle_click(click)
    }

    /// Raw "surface closed" signal from the renderer.
    fn handle_surface_closed(&self) {
        self.core().handle_surface_closed();
    }

    fn as_pageable(&self) -> Option<&PageableMenu> {
        None
    }
}
