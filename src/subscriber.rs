//! Event listeners.

use std::borrow::Cow;

use crate::ws::RealtimeEvent;

/// Listener can be subscribed to a session and receive every delivered event.
///
/// Delivery is synchronous and in transport order. A listener that panics is logged
/// and skipped, other listeners still receive the event.
pub trait Listener: Send + Sync {
    /// listener name, used in logs
    fn name(&self) -> Cow<'static, str> {
        "anonymous listener".into()
    }

    /// callback executed for each delivered event
    fn on_event(&self, event: &RealtimeEvent);
}

impl<F> Listener for F
where
    F: Fn(&RealtimeEvent) + Send + Sync,
{
    fn on_event(&self, event: &RealtimeEvent) {
        self(event)
    }
}
