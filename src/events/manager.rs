//! Listener registry and event dispatch.
//!
//! Handlers are explicit typed closures grouped into a [`Listener`]. Each
//! handler list is copy-on-write: dispatch iterates a snapshot, so handlers may
//! register or unregister listeners while an event is in flight.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info};

use crate::events::types::MenuEvent;
use crate::types::DefinitionTag;

/// Result of a single handler invocation.
pub type HandlerResult = anyhow::Result<()>;

type ErasedHandler = Arc<dyn Fn(&mut dyn Any) -> HandlerResult + Send + Sync>;

/// Ordering and filtering options for one handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Lower runs first; ties keep registration order.
    pub priority: i32,
    /// Skip this handler once an earlier one has cancelled the event.
    pub ignore_cancelled: bool,
}

impl HandlerOptions {
    pub fn priority(priority: i32) -> Self {
        Self {
            priority,
            ignore_cancelled: false,
        }
    }

    pub fn ignore_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }
}

#[derive(Clone)]
struct PendingHandler {
    event_type: TypeId,
    event_name: &'static str,
    name: String,
    options: HandlerOptions,
    callback: ErasedHandler,
}

/// A set of handlers registered and unregistered together.
///
/// The listener id is compared against the definition tag stored in an
/// event's context; handlers only see events from menus their definition made.
#[derive(Clone)]
pub struct Listener {
    id: DefinitionTag,
    handlers: Vec<PendingHandler>,
}

impl Listener {
    pub fn new(id: impl Into<DefinitionTag>) -> Self {
        Self {
            id: id.into(),
            handlers: Vec::new(),
        }
    }

    pub fn id(&self) -> &DefinitionTag {
        &self.id
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Add a handler for events of type `E`.
    pub fn on<E, F>(&mut self, name: impl Into<String>, options: HandlerOptions, handler: F) -> &mut Self
    where
        E: MenuEvent,
        F: Fn(&mut E) -> HandlerResult + Send + Sync + 'static,
    {
        let callback: ErasedHandler = Arc::new(move |event: &mut dyn Any| {
            match event.downcast_mut::<E>() {
                Some(event) => handler(event),
                None => Ok(()),
            }
        });
        self.handlers.push(PendingHandler {
            event_type: TypeId::of::<E>(),
            event_name: E::NAME,
            name: name.into(),
            options,
            callback,
        });
        self
    }
}

#[derive(Clone)]
struct HandlerEntry {
    listener: DefinitionTag,
    name: String,
    priority: i32,
    ignore_cancelled: bool,
    seq: u64,
    callback: ErasedHandler,
}

/// Outcome counters for one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub invoked: usize,
    pub failed: usize,
}

/// Process-wide registry mapping event types to ordered handler lists.
#[derive(Default)]
pub struct EventManager {
    handlers: RwLock<HashMap<TypeId, Arc<Vec<HandlerEntry>>>>,
    next_seq: AtomicU64,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every handler of `listener`.
    ///
    /// Registration is idempotent per listener id: handlers already registered
    /// under the same id are replaced, never duplicated.
    pub fn register_listener(&self, listener: &Listener) {
        let mut handlers = self.handlers.write();
        remove_listener(&mut handlers, &listener.id);

        for pending in &listener.handlers {
            let entry = HandlerEntry {
                listener: listener.id.clone(),
                name: pending.name.clone(),
                priority: pending.options.priority,
                ignore_cancelled: pending.options.ignore_cancelled,
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                callback: pending.callback.clone(),
            };
            let slot = handlers.entry(pending.event_type).or_default();
            let mut updated: Vec<HandlerEntry> = (**slot).clone();
            updated.push(entry);
            updated.sort_by_key(|e| (e.priority, e.seq));
            *slot = Arc::new(updated);
            debug!(
                listener = %listener.id,
                handler = %pending.name,
                event = pending.event_name,
                priority = pending.options.priority,
                "Registered handler"
            );
        }

        info!(
            listener = %listener.id,
            handlers = listener.handlers.len(),
            "Registered listener"
        );
    }

    /// Remove every handler registered under `id`. Returns how many were removed.
    pub fn unregister_listener(&self, id: &DefinitionTag) -> usize {
        let removed = remove_listener(&mut self.handlers.write(), id);
        if removed > 0 {
            info!(listener = %id, handlers = removed, "Unregistered listener");
        }
        removed
    }

    pub fn is_registered(&self, id: &DefinitionTag) -> bool {
        self.handlers
            .read()
            .values()
            .any(|list| list.iter().any(|e| &e.listener == id))
    }

    /// Number of handlers registered for events of type `E`.
    pub fn handler_count<E: MenuEvent>(&self) -> usize {
        self.handlers
            .read()
            .get(&TypeId::of::<E>())
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.handlers.write().clear();
        debug!("Cleared event registry");
    }

    /// Dispatch `event` to matching handlers in priority order.
    ///
    /// When the event's context carries a definition tag, only handlers of the
    /// listener with that id run. A failing or panicking handler is logged and
    /// the remaining handlers still run.
    pub fn fire<E: MenuEvent>(&self, event: &mut E) -> DispatchSummary {
        let mut summary = DispatchSummary::default();

        let snapshot = self.handlers.read().get(&TypeId::of::<E>()).cloned();
        let Some(handlers) = snapshot else {
            return summary;
        };
        if handlers.is_empty() {
            return summary;
        }

        let tag = event.context().definition_tag();

        for entry in handlers.iter() {
            if let Some(tag) = &tag {
                if &entry.listener != tag {
                    continue;
                }
            }
            if event.is_cancelled() && entry.ignore_cancelled {
                continue;
            }

            summary.invoked += 1;
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (entry.callback)(&mut *event as &mut dyn Any)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    summary.failed += 1;
                    error!(
                        listener = %entry.listener,
                        handler = %entry.name,
                        event = E::NAME,
                        error = %err,
                        "Error invoking event handler"
                    );
                }
                Err(panic) => {
                    summary.failed += 1;
                    error!(
                        listener = %entry.listener,
                        handler = %entry.name,
                        event = E::NAME,
                        panic = %panic_message(panic.as_ref()),
                        "Event handler panicked"
                    );
                }
            }
        }

        summary
    }
}

fn remove_listener(handlers: &mut HashMap<TypeId, Arc<Vec<HandlerEntry>>>, id: &DefinitionTag) -> usize {
    let mut removed = 0;
    for slot in handlers.values_mut() {
        if slot.iter().any(|e| &e.listener == id) {
            let before = slot.len();
            let kept: Vec<HandlerEntry> = slot.iter().filter(|e| &e.listener != id).cloned().collect();
            removed += before - kept.len();
            *slot = Arc::new(kept);
        }
    }
    handlers.retain(|_, list| !list.is_empty());
    removed
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
