use std::sync::Arc;

use tokio::sync::mpsc;

use super::{shared::Shared, Status, TransportKind};
use crate::{
    dispatcher::Dispatcher,
    ws::{Message, RealtimeEvent},
};

/// Handle a transport task uses to report into its session.
///
/// Every method is a no-op returning `false` (or `None`) once the session has moved on
/// to another generation or was disconnected, the task should stop then.
#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    shared: Arc<Shared>,
    generation: u64,
}

impl EventSender {
    pub fn new(shared: Arc<Shared>, generation: u64) -> Self {
        Self { shared, generation }
    }

    pub fn is_current(&self) -> bool {
        self.shared.with_current(self.generation, |_| ()).is_some()
    }

    pub fn set_status(&self, transport: TransportKind, status: Status) -> bool {
        self.shared.set_status(self.generation, transport, status)
    }

    pub fn set_attempts(&self, attempts: u32) -> bool {
        self.shared
            .with_current(self.generation, |state| state.reconnect_attempts = attempts)
            .is_some()
    }

    /// Deliver an event to listeners, control events are dropped here.
    ///
    /// Listeners are taken under the session lock together with the generation check,
    /// then called outside it so they may use the session themselves.
    pub fn send_event(&self, event: RealtimeEvent) -> bool {
        if event.is_control() {
            log::trace!("Drop {} control event", event.r#type);
            return self.is_current();
        }

        let listeners = self
            .shared
            .with_current(self.generation, |_| self.shared.dispatcher.snapshot());

        match listeners {
            Some(listeners) => {
                Dispatcher::deliver(&listeners, &event);
                true
            }
            None => {
                log::debug!("Drop {} event of stale transport", event.r#type);
                false
            }
        }
    }

    pub fn cursor(&self) -> Option<Option<String>> {
        self.shared
            .with_current(self.generation, |state| state.last_event_cursor.clone())
    }

    pub fn update_cursor(&self, cursor: String) -> bool {
        self.shared
            .with_current(self.generation, |state| {
                log::trace!("Update cursor to {}", cursor);
                state.last_event_cursor = Some(cursor);
            })
            .is_some()
    }

    /// Socket is open: attempts back to zero, status connected, outbound frames accepted
    pub fn socket_opened(&self, outbound: mpsc::UnboundedSender<Message>) -> bool {
        let installed = self
            .shared
            .with_current(self.generation, |state| {
                state.reconnect_attempts = 0;
                state.outbound = Some(outbound);
            })
            .is_some();

        installed && self.set_status(TransportKind::Socket, Status::Connected)
    }

    pub fn socket_closed(&self) -> bool {
        self.shared
            .with_current(self.generation, |state| state.outbound = None)
            .is_some()
    }

    /// Credential rejected, tear the session down as a manual disconnect would
    pub fn auth_failed(&self) {
        self.shared.teardown_from(self.generation);
    }
}
