// ── Synchronous publish/subscribe core ──
//
// Named events, per-event ordered listener sets, and fault isolation:
// a failing listener is logged and republished as an `error` event, and
// `publish` itself never fails. No registry lock is held while a listener
// runs, so listeners may re-enter the publisher or the store.

mod payload;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{trace, warn};

pub use payload::{EventKind, EventPayload};

// ── ListenerError ────────────────────────────────────────────────────

/// A fault raised by a listener while handling an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    #[error("listener failed: {message}")]
    Failed { message: String },

    #[error("listener panicked: {message}")]
    Panicked { message: String },
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

// ── Listener ─────────────────────────────────────────────────────────

type Callback = dyn Fn(&EventPayload) -> Result<(), ListenerError> + Send + Sync;

/// A cloneable listener handle.
///
/// Identity is handle identity: clones of one `Listener` are the same
/// listener, two `Listener`s built from equal closures are not.
#[derive(Clone)]
pub struct Listener {
    callback: Arc<Callback>,
}

impl Listener {
    /// Wrap a fallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&EventPayload) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Wrap a callback that cannot fail.
    pub fn from_fn<F>(callback: F) -> Self
    where
        F: Fn(&EventPayload) + Send + Sync + 'static,
    {
        Self::new(move |payload| {
            callback(payload);
            Ok(())
        })
    }

    /// Whether both handles refer to the same listener.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }

    /// Invoke the callback, converting a panic into a `ListenerError`.
    fn invoke(&self, payload: &EventPayload) -> Result<(), ListenerError> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(payload))).unwrap_or_else(
            |cause| {
                Err(ListenerError::Panicked {
                    message: panic_message(cause.as_ref()),
                })
            },
        )
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("ptr", &Arc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".into()
    }
}

// ── EventPublisher ───────────────────────────────────────────────────

#[derive(Clone)]
struct Subscription {
    listener: Listener,
    once: bool,
}

/// Synchronous, in-process event publisher.
///
/// Listeners for one event run in registration order on the caller's
/// stack. Registering the same listener twice for one event is a no-op.
#[derive(Default)]
pub struct EventPublisher {
    listeners: DashMap<String, Vec<Subscription>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`. Returns `false` if it was already registered.
    pub fn subscribe(&self, event: impl AsRef<str>, listener: Listener) -> bool {
        self.register(event.as_ref(), listener, false)
    }

    /// Register a one-shot wrapper around `listener` for `event` and return
    /// the wrapper, which can be passed to [`unsubscribe`](Self::unsubscribe)
    /// to cancel it before it fires.
    ///
    /// The wrapper is a distinct listener, so it is delivered even when
    /// `listener` is also subscribed normally. It is removed before it runs
    /// and fires exactly once even when the listener republishes `event`.
    pub fn subscribe_once(&self, event: impl AsRef<str>, listener: Listener) -> Listener {
        let wrapper = Listener::new(move |payload| (listener.callback)(payload));
        self.register(event.as_ref(), wrapper.clone(), true);
        wrapper
    }

    /// Remove `listener` from `event`. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, event: impl AsRef<str>, listener: &Listener) -> bool {
        let event = event.as_ref();
        let removed = {
            let Some(mut subscriptions) = self.listeners.get_mut(event) else {
                return false;
            };
            let before = subscriptions.len();
            subscriptions.retain(|s| !s.listener.same(listener));
            subscriptions.len() != before
        };
        self.listeners.remove_if(event, |_, subscriptions| subscriptions.is_empty());
        removed
    }

    /// Clear the listeners of one event, or of every event when `event` is `None`.
    pub fn unsubscribe_all(&self, event: Option<&str>) {
        match event {
            Some(event) => {
                self.listeners.remove(event);
            }
            None => self.listeners.clear(),
        }
    }

    /// Deliver `payload` to every listener registered for `event` at the
    /// moment of the call. Returns whether any listener existed.
    pub fn publish(&self, event: impl AsRef<str>, payload: &EventPayload) -> bool {
        let event = event.as_ref();
        let subscriptions = match self.listeners.get(event) {
            Some(subscriptions) if !subscriptions.is_empty() => subscriptions.value().clone(),
            _ => {
                trace!(event, "published with no listeners");
                return false;
            }
        };

        for subscription in subscriptions {
            if subscription.once && !self.unsubscribe(event, &subscription.listener) {
                // Already consumed by a reentrant publication.
                continue;
            }
            if let Err(error) = subscription.listener.invoke(payload) {
                self.report(event, error, payload);
            }
        }
        true
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: impl AsRef<str>) -> usize {
        self.listeners.get(event.as_ref()).map_or(0, |s| s.len())
    }

    /// Names of all events that currently have listeners, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .listeners
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn register(&self, event: &str, listener: Listener, once: bool) -> bool {
        let mut subscriptions = self.listeners.entry(event.to_owned()).or_default();
        if subscriptions.iter().any(|s| s.listener.same(&listener)) {
            return false;
        }
        subscriptions.push(Subscription { listener, once });
        true
    }

    fn report(&self, event: &str, error: ListenerError, payload: &EventPayload) {
        warn!(event, error = %error, "listener failed");
        if event == EventKind::Error.as_ref() {
            return;
        }
        let wrapped = EventPayload::Error {
            original_event: event.to_owned(),
            error,
            payload: Box::new(payload.clone()),
        };
        self.publish(EventKind::Error, &wrapped);
    }
}

impl fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<(String, usize)> = self
            .event_names()
            .into_iter()
            .map(|name| {
                let count = self.listener_count(&name);
                (name, count)
            })
            .collect();
        f.debug_struct("EventPublisher")
            .field("listeners", &counts)
            .finish()
    }
}
