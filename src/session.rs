//! Menu sessions: the lifecycle wrapper around one menu instance and the link
//! back to the session it was opened from.

use std::fmt;
use std::ptr;
use std::sync::{Arc, OnceLock, Weak};

use futures::channel::oneshot;
use futures::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::MenuError;
use crate::events::{CloseEvent, EventBase, EventManager, MenuEvent, OpenEvent};
use crate::menu::Menu;
use crate::types::{SessionId, UserId};

/// Snapshot of a successful open, handed to whoever awaits [`OpenResult`].
#[derive(Debug, Clone)]
pub struct Opened {
    pub session_id: SessionId,
    pub user: UserId,
    pub context: Context,
    session: Weak<MenuSession>,
}

impl Opened {
    /// The session, while something else still keeps it alive.
    pub fn session(&self) -> Option<Arc<MenuSession>> {
        self.session.upgrade()
    }
}

pub type OpenOutcome = Result<Opened, MenuError>;

#[derive(Default)]
struct ResultState {
    outcome: Option<OpenOutcome>,
    waiters: Vec<oneshot::Sender<OpenOutcome>>,
}

/// Completes at most once, on the first open attempt of its session.
#[derive(Default)]
pub struct OpenResult {
    state: Mutex<ResultState>,
}

impl OpenResult {
    /// Returns false if the result was already completed.
    pub(crate) fn complete(&self, outcome: OpenOutcome) -> bool {
        let waiters = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                return false;
            }
            state.outcome = Some(outcome.clone());
            std::mem::take(&mut state.waiters)
        };
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    pub fn get(&self) -> Option<OpenOutcome> {
        self.state.lock().outcome.clone()
    }

    /// Resolves with the outcome, or [`MenuError::SessionDropped`] if the
    /// session goes away first.
    pub fn wait(&self) -> BoxFuture<'static, OpenOutcome> {
        let mut state = self.state.lock();
        if let Some(outcome) = &state.outcome {
            return future::ready(outcome.clone()).boxed();
        }
        let (tx, rx) = oneshot::channel();
        state.waiters.push(tx);
        async move { rx.await.unwrap_or(Err(MenuError::SessionDropped)) }.boxed()
    }
}

/// The only object that opens and closes its menu on application intent.
pub struct MenuSession {
    id: SessionId,
    menu: Arc<dyn Menu>,
    user: UserId,
    context: Context,
    events: Arc<EventManager>,
    previous: OnceLock<Arc<MenuSession>>,
    result: OpenResult,
}

impl MenuSession {
    pub fn new(menu: Arc<dyn Menu>, user: UserId, context: Context, events: Arc<EventManager>) -> Arc<Self> {
        Arc::new(Self {
            id: SessionId::next(),
            menu,
            user,
            context,
            events,
            previous: OnceLock::new(),
            result: OpenResult::default(),
        })
    }

    pub fn with_previous(
        menu: Arc<dyn Menu>,
        user: UserId,
        context: Context,
        events: Arc<EventManager>,
        previous: Option<Arc<MenuSession>>,
    ) -> Result<Arc<Self>, MenuError> {
        let session = Self::new(menu, user, context, events);
        if let Some(previous) = previous {
            session.set_previous_session(previous)?;
        }
        Ok(session)
    }

    /// Link the session this one was opened from. Can be set once; a link that
    /// would make the chain loop back to this session is rejected.
    pub fn set_previous_session(&self, previous: Arc<MenuSession>) -> Result<(), MenuError> {
        let mut cursor = Some(&previous);
        while let Some(session) = cursor {
            if ptr::eq(Arc::as_ptr(session), self) {
                return Err(MenuError::precondition("Previous session would form a cycle"));
            }
            cursor = session.previous.get();
        }
        self.previous
            .set(previous)
            .map_err(|_| MenuError::precondition("Previous session is already set"))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn menu(&self) -> &Arc<dyn Menu> {
        &self.menu
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn event_manager(&self) -> &Arc<EventManager> {
        &self.events
    }

    pub fn previous_session(&self) -> Option<&Arc<MenuSession>> {
        self.previous.get()
    }

    /// Number of sessions behind this one.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.previous.get();
        while let Some(session) = cursor {
            depth += 1;
            cursor = session.previous.get();
        }
        depth
    }

    pub fn is_open(&self) -> bool {
        self.menu.is_open()
    }

    pub fn result(&self) -> &OpenResult {
        &self.result
    }

    fn menu_id(&self) -> String {
        self.context
            .definition_tag()
            .map(|tag| tag.as_str().to_string())
            .unwrap_or_else(|| self.menu.core().title().to_string())
    }

    /// Bind to the menu, fire Open and show the menu unless a listener
    /// cancelled. The result completes on the first attempt either way.
    pub fn open(self: &Arc<Self>) {
        if self.is_open() {
            return;
        }
        let core = self.menu.core();
        core.bind(self.clone(), self.context.clone());

        let mut event = OpenEvent::new(EventBase::for_session(self));
        self.events.fire(&mut event);

        if event.is_cancelled() {
            core.unbind();
            let menu_id = self.menu_id();
            warn!(session = %self.id, menu = %menu_id, "Open cancelled by listener");
            self.result.complete(Err(MenuError::OpenCancelled { menu_id }));
            return;
        }

        self.menu.open();
        if !self.menu.is_open() {
            core.unbind();
            debug!(session = %self.id, user = %self.user, "Menu not shown, user unreachable");
        }

        self.result.complete(Ok(Opened {
            session_id: self.id,
            user: self.user.clone(),
            context: event.context().clone(),
            session: Arc::downgrade(self),
        }));
    }

    /// Fire Close, then close the menu unless a listener cancelled.
    /// Returns whether the menu is closed afterwards.
    pub fn close(self: &Arc<Self>, silent: bool) -> bool {
        if !self.is_open() {
            return true;
        }
        let mut event = CloseEvent::new(EventBase::for_session(self), silent);
        self.events.fire(&mut event);
        if event.is_cancelled() {
            warn!(session = %self.id, "Close cancelled by listener");
            return false;
        }
        self.menu.close(silent);
        !self.is_open()
    }

    /// Close this session silently and reopen the one it came from.
    /// Returns false, doing nothing, when there is no previous session.
    pub fn go_back(self: &Arc<Self>) -> bool {
        let Some(previous) = self.previous.get().cloned() else {
            return false;
        };
        self.close(true);
        previous.open();
        debug!(from = %self.id, to = %previous.id, "Navigated back");
        true
    }
}

impl fmt::Debug for MenuSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuSession")
            .field("id", &self.id)
            .field("user", &self.user)
            .field("depth", &self.depth())
            .field("open", &self.is_open())
            .finish()
    }
}
