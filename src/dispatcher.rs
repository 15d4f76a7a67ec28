//! Fan out delivered events to subscribed listeners.

use std::{
    any::Any,
    fmt::Debug,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use crate::{subscriber::Listener, ws::RealtimeEvent};

type ListenerSet = Vec<Arc<dyn Listener>>;

fn same_listener(a: &Arc<dyn Listener>, b: &Arc<dyn Listener>) -> bool {
    // compare data address only, vtable address of the same type may differ
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

fn lock(listeners: &Mutex<ListenerSet>) -> MutexGuard<'_, ListenerSet> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// A set of listeners, unique by identity.
pub struct Dispatcher {
    listeners: Arc<Mutex<ListenerSet>>,
}

impl Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a listener, the same `Arc` registered twice is only called once per event.
    pub fn subscribe(&self, listener: Arc<dyn Listener>) -> Subscription {
        let mut listeners = lock(&self.listeners);

        if listeners.iter().any(|l| same_listener(l, &listener)) {
            log::trace!("Listener {} already subscribed", listener.name());
        } else {
            log::debug!("Subscribe listener {}", listener.name());
            listeners.push(Arc::clone(&listener));
        }

        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            listener,
        }
    }

    /// Remove all listeners
    pub fn clear(&self) {
        drop(self.take_all());
    }

    /// Remove all listeners, handing them back so they can be dropped elsewhere
    pub(crate) fn take_all(&self) -> Vec<Arc<dyn Listener>> {
        let mut listeners = lock(&self.listeners);
        log::debug!("Clear {} listeners", listeners.len());
        std::mem::take(&mut *listeners)
    }

    /// count of subscribed listeners
    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// true when nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every listener with the event.
    ///
    /// Listeners are called outside the lock, so a listener may subscribe or unsubscribe
    /// from inside its callback; such changes apply from the next event.
    pub fn dispatch(&self, event: &RealtimeEvent) {
        Self::deliver(&self.snapshot(), event);
    }

    /// listeners subscribed right now
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        lock(&self.listeners).clone()
    }

    /// Call each listener of a snapshot, isolating panics
    pub(crate) fn deliver(snapshot: &[Arc<dyn Listener>], event: &RealtimeEvent) {
        log::trace!(
            "Dispatch {} event to {} listeners",
            event.r#type,
            snapshot.len()
        );

        for listener in snapshot {
            let result = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if let Err(payload) = result {
                log::error!(
                    "Listener {} panicked on {} event: {}",
                    listener.name(),
                    event.r#type,
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

/// Handle returned by subscribe, removes exactly its listener.
///
/// Dropping the handle keeps the listener subscribed.
pub struct Subscription {
    listeners: Weak<Mutex<ListenerSet>>,
    listener: Arc<dyn Listener>,
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener.name())
            .finish()
    }
}

impl Subscription {
    /// Remove the listener, no-op if it is already gone
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut listeners = lock(&listeners);
            let before = listeners.len();
            listeners.retain(|l| !same_listener(l, &self.listener));
            if listeners.len() != before {
                log::debug!("Unsubscribe listener {}", self.listener.name());
            }
        }
    }
}
