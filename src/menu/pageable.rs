//! Multi-page menu: a content area over a fixed navigation row.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::context::{keys, Context};
use crate::definition::ContentProvider;
use crate::error::MenuError;
use crate::menu::base::{validate_size, MenuCore};
use crate::menu::decoration::{empty_slots_by_row, row_gradient};
use crate::menu::{ClickOutcome, Menu, MenuEnv, MenuItem, RawClick, MAX_ROWS, ROW_SIZE};
use crate::types::UserId;
use crate::visual::Visual;

/// Offsets within the navigation row.
pub const BACK_OFFSET: usize = 1;
pub const PREVIOUS_OFFSET: usize = 3;
pub const CLOSE_OFFSET: usize = 4;
pub const NEXT_OFFSET: usize = 5;

struct PagerState {
    pages: Vec<Arc<dyn ContentProvider>>,
    current: usize,
    previous: Option<Visual>,
    next: Option<Visual>,
    close: Option<Visual>,
}

pub struct PageableMenu {
    core: MenuCore,
    content_size: usize,
    pager: Mutex<PagerState>,
}

impl PageableMenu {
    /// `content_rows` excludes the navigation row, so at most five are allowed.
    pub fn new(
        title: &str,
        content_rows: usize,
        user: UserId,
        context: Context,
        env: MenuEnv,
    ) -> Result<Arc<Self>, MenuError> {
        if content_rows == 0 || content_rows >= MAX_ROWS {
            return Err(MenuError::precondition(format!(
                "Content rows must be between 1 and {}, got {}",
                MAX_ROWS - 1,
                content_rows
            )));
        }
        let content_size = content_rows * ROW_SIZE;
        let size = content_size + ROW_SIZE;
        validate_size(size)?;

        let buttons = &env.config.decoration;
        let pager = PagerState {
            pages: Vec::new(),
            current: 0,
            previous: Some(buttons.previous_button.clone()),
            next: Some(buttons.next_button.clone()),
            close: Some(buttons.close_button.clone()),
        };

        Ok(Arc::new_cyclic(|this: &Weak<PageableMenu>| {
            let this: Weak<dyn Menu> = this.clone();
            PageableMenu {
                core: MenuCore::new(title, size, user, context, env, this),
                content_size,
                pager: Mutex::new(pager),
            }
        }))
    }

    /// Cells available to page content.
    pub fn content_size(&self) -> usize {
        self.content_size
    }

    pub fn add_page(&self, page: Arc<dyn ContentProvider>) {
        self.pager.lock().pages.push(page);
    }

    pub fn add_pages(&self, pages: impl IntoIterator<Item = Arc<dyn ContentProvider>>) {
        self.pager.lock().pages.extend(pages);
    }

    /// Override the navigation visuals. `None` hides that control.
    pub fn set_navigation_items(&self, previous: Option<Visual>, next: Option<Visual>, close: Option<Visual>) {
        let mut pager = self.pager.lock();
        pager.previous = previous;
        pager.next = next;
        pager.close = close;
    }

    pub fn current_page(&self) -> usize {
        self.pager.lock().current
    }

    pub fn page_count(&self) -> usize {
        self.pager.lock().pages.len()
    }

    pub fn has_next_page(&self) -> bool {
        let pager = self.pager.lock();
        pager.current + 1 < pager.pages.len()
    }

    pub fn has_previous_page(&self) -> bool {
        self.pager.lock().current > 0
    }

    /// Show page `index`. Out-of-range indices are an error, never clamped.
    pub fn go_to_page(&self, index: usize) -> Result<(), MenuError> {
        {
            let mut pager = self.pager.lock();
            if index >= pager.pages.len() {
                return Err(MenuError::precondition(format!(
                    "Page index out of bounds: {}",
                    index
                )));
            }
            pager.current = index;
        }
        self.draw_current_page();
        debug!(surface = %self.core.surface().id, page = index, "Changed page");
        Ok(())
    }

    /// Returns false at the last page.
    pub fn next_page(&self) -> bool {
        if !self.has_next_page() {
            return false;
        }
        self.go_to_page(self.current_page() + 1).is_ok()
    }

    /// Returns false at the first page.
    pub fn previous_page(&self) -> bool {
        if !self.has_previous_page() {
            return false;
        }
        self.go_to_page(self.current_page() - 1).is_ok()
    }

    /// Rebuild every slot from the current page and the navigation row.
    fn draw_current_page(&self) {
        let (page, has_previous, has_next, previous, next, close) = {
            let pager = self.pager.lock();
            let Some(page) = pager.pages.get(pager.current).cloned() else {
                return;
            };
            (
                page,
                pager.current > 0,
                pager.current + 1 < pager.pages.len(),
                pager.previous.clone(),
                pager.next.clone(),
                pager.close.clone(),
            )
        };
        // Providers are user code; no lock is held here.
        let contents = page.contents();

        let mut items: BTreeMap<usize, MenuItem> = BTreeMap::new();
        for (slot, visual) in contents.into_iter().enumerate().take(self.content_size) {
            if let Some(visual) = visual {
                items.insert(slot, MenuItem::new(slot, visual));
            }
        }

        let decoration = &self.core.env().config.decoration;
        let by_row = empty_slots_by_row(self.content_size, |slot| items.contains_key(&slot));
        for (slot, color) in row_gradient(&by_row, &decoration.page_palette) {
            items.insert(slot, MenuItem::new(slot, Visual::pane(color)));
        }

        let row = self.content_size;
        let context = self.core.context();
        if self.core.has_previous() {
            let slot = row + BACK_OFFSET;
            items.insert(slot, MenuItem::new(slot, decoration.back_button.clone()));
            context.set_back_button_slot(slot);
        }
        if let (true, Some(visual)) = (has_previous, previous) {
            let slot = row + PREVIOUS_OFFSET;
            items.insert(slot, MenuItem::new(slot, visual));
        }
        let close_slot = row + CLOSE_OFFSET;
        if let Some(visual) = close {
            items.insert(close_slot, MenuItem::new(close_slot, visual));
            context.set_close_button_slot(close_slot);
        } else if context.close_button_slot() == Some(close_slot) {
            context.remove(keys::CLOSE_BUTTON_SLOT);
        }
        if let (true, Some(visual)) = (has_next, next) {
            let slot = row + NEXT_OFFSET;
            items.insert(slot, MenuItem::new(slot, visual));
        }
        for slot in row..row + ROW_SIZE {
            items
                .entry(slot)
                .or_insert_with(|| MenuItem::new(slot, Visual::pane(decoration.navigation_filler)));
        }

        self.core.replace_items(items.into_values());
    }

    fn handle_navigation_click(&self, slot: usize) {
        if let Some(session) = self.core.session() {
            let context = self.core.context();
            if self.core.try_close_button(slot, &session, &context)
                || self.core.try_back_button(slot, &session, &context)
            {
                return;
            }
        }
        match slot - self.content_size {
            PREVIOUS_OFFSET => {
                self.previous_page();
            }
            NEXT_OFFSET => {
                self.next_page();
            }
            _ => {}
        }
    }
}

impl Menu for PageableMenu {
    fn core(&self) -> &MenuCore {
        &self.core
    }

    fn open(&self) {
        if self.core.is_open() {
            return;
        }
        self.draw_current_page();
        self.core.open();
    }

    fn handle_click(&self, click: RawClick) -> ClickOutcome {
        if click.slot >= self.core.size() {
            return ClickOutcome::Ignored;
        }
        if click.slot >= self.content_size {
            self.handle_navigation_click(click.slot);
            return ClickOutcome::Vetoed;
        }
        self.core.handle_click(click)
    }

    fn as_pageable(&self) -> Option<&PageableMenu> {
        Some(self)
    }
}

impl Deref for PageableMenu {
    type Target = MenuCore;

    fn deref(&self) -> &MenuCore {
        &self.core
    }
}
