//! State and behaviour shared by every menu implementation.
//!
//! Locking rule: the state mutex is never held while calling the renderer,
//! firing events or touching a session. Renderers and handlers may call
//! straight back into the menu.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::FillPolicy;
use crate::context::{keys, Context};
use crate::error::MenuError;
use crate::events::{ClickEvent, CloseEvent, EventBase, MenuEvent};
use crate::menu::decoration::{empty_slots_by_row, gradient_palette, row_gradient};
use crate::menu::{ClickOutcome, Menu, MenuEnv, MenuItem, RawClick, MAX_ROWS, ROW_SIZE};
use crate::render::Surface;
use crate::session::MenuSession;
use crate::types::UserId;
use crate::visual::{PaneColor, Visual};

struct MenuState {
    items: BTreeMap<usize, MenuItem>,
    open: bool,
    uncloseable: bool,
    fill: FillPolicy,
    session: Option<Arc<MenuSession>>,
    context: Context,
}

/// Slot contents, open flag, uncloseable lock and session binding of one menu.
pub struct MenuCore {
    surface: Surface,
    env: MenuEnv,
    this: Weak<dyn Menu>,
    state: Mutex<MenuState>,
}

/// Reject grid sizes a surface cannot show.
pub(crate) fn validate_size(size: usize) -> Result<(), MenuError> {
    if size % ROW_SIZE != 0 || size < ROW_SIZE || size > ROW_SIZE * MAX_ROWS {
        return Err(MenuError::precondition(format!(
            "Size must be a multiple of {} between {} and {}, got {}",
            ROW_SIZE,
            ROW_SIZE,
            ROW_SIZE * MAX_ROWS,
            size
        )));
    }
    Ok(())
}

impl MenuCore {
    /// `size` must already have passed [`validate_size`]; `this` points back at
    /// the menu that owns this core.
    pub(crate) fn new(
        title: &str,
        size: usize,
        user: UserId,
        context: Context,
        env: MenuEnv,
        this: Weak<dyn Menu>,
    ) -> Self {
        let fill = env.config.decoration.fill;
        Self {
            surface: Surface::new(user, title, size),
            env,
            this,
            state: Mutex::new(MenuState {
                items: BTreeMap::new(),
                open: false,
                uncloseable: false,
                fill,
                session: None,
                context,
            }),
        }
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn size(&self) -> usize {
        self.surface.size
    }

    pub fn title(&self) -> &str {
        &self.surface.title
    }

    pub fn user(&self) -> &UserId {
        &self.surface.user
    }

    pub fn env(&self) -> &MenuEnv {
        &self.env
    }

    pub fn context(&self) -> Context {
        self.state.lock().context.clone()
    }

    /// The session currently driving this menu, while it is bound.
    pub fn session(&self) -> Option<Arc<MenuSession>> {
        self.state.lock().session.clone()
    }

    pub(crate) fn bind(&self, session: Arc<MenuSession>, context: Context) {
        let mut state = self.state.lock();
        state.session = Some(session);
        state.context = context;
    }

    pub(crate) fn unbind(&self) -> Option<Arc<MenuSession>> {
        self.state.lock().session.take()
    }

    fn binding(&self) -> Option<(Arc<MenuSession>, Context)> {
        let state = self.state.lock();
        state
            .session
            .clone()
            .map(|session| (session, state.context.clone()))
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn is_uncloseable(&self) -> bool {
        self.state.lock().uncloseable
    }

    /// While set, the user cannot close the menu and every interaction is vetoed.
    pub fn set_uncloseable(&self, uncloseable: bool) {
        self.state.lock().uncloseable = uncloseable;
    }

    pub fn fill_policy(&self) -> FillPolicy {
        self.state.lock().fill
    }

    pub fn set_fill_policy(&self, fill: FillPolicy) {
        self.state.lock().fill = fill;
    }

    /// Place `item` at its slot, evicting whatever was there.
    pub fn add_item(&self, item: MenuItem) -> Result<(), MenuError> {
        self.check_slot(item.slot())?;
        let slot = item.slot();
        let shown = {
            let mut state = self.state.lock();
            let visual = item.visual().clone();
            state.items.insert(slot, item);
            state.open.then_some(visual)
        };
        if let Some(visual) = shown {
            self.env.renderer.set_cell(&self.surface, slot, Some(&visual));
        }
        Ok(())
    }

    pub fn remove_item(&self, slot: usize) -> Option<MenuItem> {
        let (removed, open) = {
            let mut state = self.state.lock();
            (state.items.remove(&slot), state.open)
        };
        if removed.is_some() && open {
            self.env.renderer.set_cell(&self.surface, slot, None);
        }
        removed
    }

    pub fn item(&self, slot: usize) -> Option<MenuItem> {
        self.state.lock().items.get(&slot).cloned()
    }

    /// Items in slot order.
    pub fn items(&self) -> Vec<MenuItem> {
        self.state.lock().items.values().cloned().collect()
    }

    pub fn clear_items(&self) {
        let open = {
            let mut state = self.state.lock();
            state.items.clear();
            state.open
        };
        if open {
            self.draw();
        }
    }

    /// Replace every item at once and redraw if showing.
    pub(crate) fn replace_items(&self, items: impl IntoIterator<Item = MenuItem>) {
        let open = {
            let mut state = self.state.lock();
            state.items = items.into_iter().map(|item| (item.slot(), item)).collect();
            state.open
        };
        if open {
            self.draw();
        }
    }

    /// Lay `contents` out from slot 0; extra entries beyond the grid are dropped.
    pub fn place_contents(&self, contents: Vec<Option<Visual>>) -> Result<(), MenuError> {
        for (slot, visual) in contents.into_iter().enumerate().take(self.size()) {
            if let Some(visual) = visual {
                self.add_item(MenuItem::new(slot, visual))?;
            }
        }
        Ok(())
    }

    /// Push every cell to the renderer. Does nothing while closed.
    pub fn draw(&self) {
        let cells: Vec<Option<Visual>> = {
            let state = self.state.lock();
            if !state.open {
                return;
            }
            (0..self.size())
                .map(|slot| state.items.get(&slot).map(|item| item.visual().clone()))
                .collect()
        };
        for (slot, visual) in cells.iter().enumerate() {
            self.env.renderer.set_cell(&self.surface, slot, visual.as_ref());
        }
    }

    /// Fill every empty slot with an unlabelled pane of one colour.
    pub fn fill_empty_slots(&self, color: PaneColor) {
        let fills: Vec<MenuItem> = {
            let state = self.state.lock();
            (0..self.size())
                .filter(|slot| !state.items.contains_key(slot))
                .map(|slot| MenuItem::new(slot, Visual::pane(color)))
                .collect()
        };
        self.place_decoration(fills);
    }

    /// Fill empty slots row by row with a gradient running from `start` (top)
    /// to `end` (bottom).
    pub fn fill_gradient(&self, start: PaneColor, end: PaneColor) {
        self.fill_area_gradient(self.size(), &gradient_palette(start, end));
    }

    /// Gradient-fill the empty slots among the first `area` cells.
    pub(crate) fn fill_area_gradient(&self, area: usize, palette: &[PaneColor]) {
        let fills: Vec<MenuItem> = {
            let state = self.state.lock();
            let by_row = empty_slots_by_row(area, |slot| state.items.contains_key(&slot));
            row_gradient(&by_row, palette)
                .into_iter()
                .map(|(slot, color)| MenuItem::new(slot, Visual::pane(color)))
                .collect()
        };
        self.place_decoration(fills);
    }

    fn place_decoration(&self, fills: Vec<MenuItem>) {
        for item in fills {
            // Slots come from 0..size, so this cannot fail.
            let _ = self.add_item(item);
        }
    }

    /// Apply the fill policy so no slot is empty when first shown.
    pub fn ensure_filled(&self) {
        match self.fill_policy() {
            FillPolicy::None => {}
            FillPolicy::Uniform { color } => self.fill_empty_slots(color),
            FillPolicy::Gradient { start, end } => self.fill_gradient(start, end),
        }
    }

    /// Place the standard close button; activating it always closes the menu.
    pub fn add_close_button(&self, slot: usize) -> Result<MenuItem, MenuError> {
        let item = MenuItem::new(slot, self.env.config.decoration.close_button.clone());
        self.add_item(item.clone())?;
        self.context().set_close_button_slot(slot);
        Ok(item)
    }

    /// Place the standard back button if there is somewhere to go back to.
    ///
    /// The session link is checked first; the context's previous-session entry
    /// covers menus configured before their session is bound.
    pub fn add_back_button(&self, slot: usize) -> Result<Option<MenuItem>, MenuError> {
        if !self.has_previous() {
            return Ok(None);
        }
        let item = MenuItem::new(slot, self.env.config.decoration.back_button.clone());
        self.add_item(item.clone())?;
        self.context().set_back_button_slot(slot);
        Ok(Some(item))
    }

    pub(crate) fn has_previous(&self) -> bool {
        let (session, context) = {
            let state = self.state.lock();
            (state.session.clone(), state.context.clone())
        };
        session
            .map(|s| s.previous_session().is_some())
            .unwrap_or(false)
            || context.contains(keys::PREVIOUS_SESSION)
    }

    fn check_slot(&self, slot: usize) -> Result<(), MenuError> {
        if slot >= self.size() {
            return Err(MenuError::precondition(format!(
                "Slot {} is outside a menu of size {}",
                slot,
                self.size()
            )));
        }
        Ok(())
    }

    /// Show the surface. No-op if already open or the user is unreachable.
    pub fn open(&self) {
        if self.is_open() || !self.env.renderer.is_reachable(self.user()) {
            return;
        }
        self.ensure_filled();
        self.env.renderer.open(&self.surface);
        self.state.lock().open = true;
        self.draw();
        debug!(surface = %self.surface.id, user = %self.user(), "Menu opened");
    }

    /// Hide the surface. A non-silent close of an uncloseable menu is refused.
    pub fn close(&self, silent: bool) {
        {
            let mut state = self.state.lock();
            if !state.open {
                return;
            }
            if state.uncloseable && !silent {
                debug!(surface = %self.surface.id, "Refused to close uncloseable menu");
                return;
            }
            state.open = false;
            state.session = None;
        }
        self.env.renderer.close(&self.surface);
        debug!(surface = %self.surface.id, silent, "Menu closed");
    }

    /// Single-page click pipeline.
    pub(crate) fn handle_click(&self, click: RawClick) -> ClickOutcome {
        if click.slot >= self.size() {
            return ClickOutcome::Ignored;
        }
        let item = self.item(click.slot);

        let Some((session, context)) = self.binding() else {
            return veto_if_fixed(item.as_ref());
        };

        if self.try_close_button(click.slot, &session, &context)
            || self.try_back_button(click.slot, &session, &context)
        {
            return ClickOutcome::Vetoed;
        }

        self.dispatch_click(click, item, session, context)
    }

    /// Fire a Click event and work out whether the host must veto the move.
    pub(crate) fn dispatch_click(
        &self,
        click: RawClick,
        item: Option<MenuItem>,
        session: Arc<MenuSession>,
        context: Context,
    ) -> ClickOutcome {
        let Some(menu) = self.this.upgrade() else {
            return veto_if_fixed(item.as_ref());
        };
        let slot = click.slot;
        let mut event = ClickEvent::new(
            EventBase::new(self.user().clone(), menu, session, context),
            slot,
            click.visual,
            item.clone(),
            click.kind,
        );
        self.env.events.fire(&mut event);

        let uncloseable = self.is_uncloseable();
        let fixed = item.as_ref().map(|i| !i.is_movable()).unwrap_or(false);
        let vetoed = event.is_cancelled() || fixed || uncloseable;

        if self.is_open() && (item.is_some() || uncloseable) {
            self.schedule_reassert(slot);
        }

        if vetoed {
            ClickOutcome::Vetoed
        } else {
            ClickOutcome::Allowed
        }
    }

    /// Close-button activation: always a silent close of the owning session.
    pub(crate) fn try_close_button(&self, slot: usize, session: &Arc<MenuSession>, context: &Context) -> bool {
        if context.close_button_slot() != Some(slot) {
            return false;
        }
        session.close(true);
        true
    }

    pub(crate) fn try_back_button(&self, slot: usize, session: &Arc<MenuSession>, context: &Context) -> bool {
        if context.back_button_slot() != Some(slot) {
            return false;
        }
        if session.previous_session().is_some() {
            return session.go_back();
        }
        if let Some(previous) = context.previous_session() {
            session.close(true);
            previous.open();
            return true;
        }
        false
    }

    /// Re-draw `slot` a tick later, after the host has applied its own
    /// change to the cell.
    fn schedule_reassert(&self, slot: usize) {
        let menu = self.this.clone();
        self.env.scheduler.schedule_after(
            self.env.config.scheduling.reassert_delay_ticks,
            Box::new(move || {
                if let Some(menu) = menu.upgrade() {
                    menu.core().reassert_slot(slot);
                }
            }),
        );
    }

    fn reassert_slot(&self, slot: usize) {
        let visual = {
            let state = self.state.lock();
            if !state.open {
                return;
            }
            state.items.get(&slot).map(|item| item.visual().clone())
        };
        self.env.renderer.set_cell(&self.surface, slot, visual.as_ref());
    }

    /// Raw "surface closed" signal: the user dismissed the surface.
    pub(crate) fn handle_surface_closed(&self) {
        let uncloseable = {
            let state = self.state.lock();
            if !state.open {
                return;
            }
            state.uncloseable
        };

        if uncloseable {
            self.schedule_reopen();
            return;
        }

        let binding = {
            let mut state = self.state.lock();
            state.open = false;
            let context = state.context.clone();
            state.session.take().map(|session| (session, context))
        };
        debug!(surface = %self.surface.id, "Menu closed by user");

        if let (Some((session, context)), Some(menu)) = (binding, self.this.upgrade()) {
            let mut event = CloseEvent::new(
                EventBase::new(self.user().clone(), menu, session, context),
                false,
            );
            self.env.events.fire(&mut event);
        }
    }

    fn schedule_reopen(&self) {
        let menu = self.this.clone();
        self.env.scheduler.schedule_after(
            self.env.config.scheduling.reopen_delay_ticks,
            Box::new(move || {
                if let Some(menu) = menu.upgrade() {
                    menu.core().reopen_after_user_close(menu.clone());
                }
            }),
        );
    }

    /// Deferred half of the uncloseable policy. A listener cancelling the
    /// Close event lets the menu go; otherwise the surface is shown again.
    fn reopen_after_user_close(&self, menu: Arc<dyn Menu>) {
        if !self.is_open() || !self.env.renderer.is_reachable(self.user()) {
            return;
        }

        if let Some((session, context)) = self.binding() {
            let mut event = CloseEvent::new(
                EventBase::new(self.user().clone(), menu, session, context),
                false,
            );
            self.env.events.fire(&mut event);
            if event.is_cancelled() {
                let mut state = self.state.lock();
                state.open = false;
                state.session = None;
                warn!(surface = %self.surface.id, "Uncloseable menu released by listener");
                return;
            }
        }

        self.env.renderer.open(&self.surface);
        self.draw();
        debug!(surface = %self.surface.id, "Reopened uncloseable menu");
    }
}

fn veto_if_fixed(item: Option<&MenuItem>) -> ClickOutcome {
    match item {
        Some(item) if !item.is_movable() => ClickOutcome::Vetoed,
        _ => ClickOutcome::Allowed,
    }
}
