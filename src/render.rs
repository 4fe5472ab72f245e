//! Host collaborator boundary: the renderer that draws surfaces and the
//! scheduler that runs deferred callbacks.
//!
//! [`MemoryRenderer`] and [`TickScheduler`] are complete in-process
//! implementations, used by headless hosts and by the test-suite.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use serde::Serialize;

use crate::types::{SurfaceId, UserId};
use crate::visual::Visual;

/// One grid shown to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub user: UserId,
    pub title: String,
    pub size: usize,
}

impl Surface {
    pub fn new(user: UserId, title: impl Into<String>, size: usize) -> Self {
        Self {
            id: SurfaceId::next(),
            user,
            title: title.into(),
            size,
        }
    }
}

/// Draws surfaces for users. Raw click and close signals travel the other
/// way, into [`Menu::handle_click`](crate::menu::Menu::handle_click) and
/// [`Menu::handle_surface_closed`](crate::menu::Menu::handle_surface_closed).
pub trait Renderer: Send + Sync {
    fn open(&self, surface: &Surface);

    fn close(&self, surface: &Surface);

    fn set_cell(&self, surface: &Surface, slot: usize, visual: Option<&Visual>);

    /// Whether the user can currently be shown anything.
    fn is_reachable(&self, _user: &UserId) -> bool {
        true
    }

    /// Short feedback line for the user, e.g. when a menu fails to open.
    fn send_message(&self, _user: &UserId, _message: &str) {}
}

pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs callbacks after a number of host ticks.
pub trait Scheduler: Send + Sync {
    fn schedule_after(&self, ticks: u64, task: Task);
}

/// Renderer operation, as recorded by [`MemoryRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    Open(SurfaceId),
    Close(SurfaceId),
    SetCell(SurfaceId, usize, Option<Visual>),
}

#[derive(Debug, Clone)]
struct SurfaceState {
    user: UserId,
    title: String,
    cells: Vec<Option<Visual>>,
    showing: bool,
    open_count: usize,
}

#[derive(Default)]
struct MemoryState {
    surfaces: HashMap<SurfaceId, SurfaceState>,
    unreachable: HashSet<UserId>,
    messages: Vec<(UserId, String)>,
    ops: Vec<RenderOp>,
}

/// In-memory renderer keeping the last drawn state of every surface.
#[derive(Default)]
pub struct MemoryRenderer {
    state: Mutex<MemoryState>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, user: &UserId, reachable: bool) {
        let mut state = self.state.lock();
        if reachable {
            state.unreachable.remove(user);
        } else {
            state.unreachable.insert(user.clone());
        }
    }

    pub fn is_showing(&self, surface: SurfaceId) -> bool {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.showing)
            .unwrap_or(false)
    }

    /// How many times the surface has been opened.
    pub fn open_count(&self, surface: SurfaceId) -> usize {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.open_count)
            .unwrap_or(0)
    }

    pub fn cells(&self, surface: SurfaceId) -> Vec<Option<Visual>> {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .map(|s| s.cells.clone())
            .unwrap_or_default()
    }

    pub fn cell(&self, surface: SurfaceId, slot: usize) -> Option<Visual> {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .and_then(|s| s.cells.get(slot).cloned().flatten())
    }

    pub fn title(&self, surface: SurfaceId) -> Option<String> {
        self.state.lock().surfaces.get(&surface).map(|s| s.title.clone())
    }

    /// Surfaces currently showing for `user`.
    pub fn showing_for(&self, user: &UserId) -> Vec<SurfaceId> {
        let mut ids: Vec<SurfaceId> = self
            .state
            .lock()
            .surfaces
            .iter()
            .filter(|(_, s)| s.showing && &s.user == user)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn messages(&self) -> Vec<(UserId, String)> {
        self.state.lock().messages.clone()
    }

    pub fn ops(&self) -> Vec<RenderOp> {
        self.state.lock().ops.clone()
    }
}

impl Renderer for MemoryRenderer {
    fn open(&self, surface: &Surface) {
        let mut state = self.state.lock();
        state.ops.push(RenderOp::Open(surface.id));
        let entry = state
            .surfaces
            .entry(surface.id)
            .or_insert_with(|| SurfaceState {
                user: surface.user.clone(),
                title: surface.title.clone(),
                cells: vec![None; surface.size],
                showing: false,
                open_count: 0,
            });
        entry.showing = true;
        entry.open_count += 1;
    }

    fn close(&self, surface: &Surface) {
        let mut state = self.state.lock();
        state.ops.push(RenderOp::Close(surface.id));
        if let Some(entry) = state.surfaces.get_mut(&surface.id) {
            entry.showing = false;
        }
    }

    fn set_cell(&self, surface: &Surface, slot: usize, visual: Option<&Visual>) {
        let mut state = self.state.lock();
        state
            .ops
            .push(RenderOp::SetCell(surface.id, slot, visual.cloned()));
        let entry = state
            .surfaces
            .entry(surface.id)
            .or_insert_with(|| SurfaceState {
                user: surface.user.clone(),
                title: surface.title.clone(),
                cells: vec![None; surface.size],
                showing: false,
                open_count: 0,
            });
        if let Some(cell) = entry.cells.get_mut(slot) {
            *cell = visual.cloned();
        }
    }

    fn is_reachable(&self, user: &UserId) -> bool {
        !self.state.lock().unreachable.contains(user)
    }

    fn send_message(&self, user: &UserId, message: &str) {
        self.state
            .lock()
            .messages
            .push((user.clone(), message.to_string()));
    }
}

struct Scheduled {
    due: u64,
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct TickState {
    now: u64,
    seq: u64,
    queue: Vec<Scheduled>,
}

/// Manually driven scheduler: the host (or a test) calls [`TickScheduler::tick`].
#[derive(Default)]
pub struct TickScheduler {
    state: Mutex<TickState>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.state.lock().now
    }

    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Advance one tick and run every task that became due. Returns how many ran.
    pub fn tick(&self) -> usize {
        let due = {
            let mut state = self.state.lock();
            state.now += 1;
            let now = state.now;
            let (mut due, rest): (Vec<Scheduled>, Vec<Scheduled>) =
                state.queue.drain(..).partition(|s| s.due <= now);
            state.queue = rest;
            due.sort_by_key(|s| (s.due, s.seq));
            due
        };
        let count = due.len();
        for scheduled in due {
            (scheduled.task)();
        }
        count
    }

    pub fn advance(&self, ticks: u64) -> usize {
        (0..ticks).map(|_| self.tick()).sum()
    }
}

impl Scheduler for TickScheduler {
    fn schedule_after(&self, ticks: u64, task: Task) {
        let mut state = self.state.lock();
        let due = state.now + ticks.max(1);
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(Scheduled { due, seq, task });
    }
}
