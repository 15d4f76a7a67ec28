use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use super::{ConnectionStatus, Status, TransportKind};
use crate::{dispatcher::Dispatcher, ws::Message};

/// Mutable fields of a connection session.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub token: Option<String>,
    pub manual_disconnect: bool,
    pub reconnect_attempts: u32,
    pub last_event_cursor: Option<String>,
    /// bumped whenever the running transport task is replaced or torn down
    pub generation: u64,
    pub outbound: Option<mpsc::UnboundedSender<Message>>,
    pub task: Option<JoinHandle<()>>,
}

/// State owned by one session, shared with its transport task.
#[derive(Debug)]
pub(crate) struct Shared {
    pub dispatcher: Dispatcher,
    state: Mutex<SessionState>,
    status: watch::Sender<ConnectionStatus>,
}

impl Default for Shared {
    fn default() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::DISCONNECTED);
        Self {
            dispatcher: Dispatcher::new(),
            state: Mutex::new(SessionState::default()),
            status,
        }
    }
}

impl Shared {
    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    fn publish(&self, status: ConnectionStatus) {
        let old = self.status.send_replace(status);
        if old != status {
            log::debug!(
                "Status {:?}/{:?} -> {:?}/{:?}",
                old.transport,
                old.status,
                status.transport,
                status.status
            );
        }
    }

    /// Run `f` only if `generation` is still the live one.
    pub fn with_current<R>(
        &self,
        generation: u64,
        f: impl FnOnce(&mut SessionState) -> R,
    ) -> Option<R> {
        let mut state = self.lock();
        if state.generation != generation || state.manual_disconnect {
            return None;
        }
        Some(f(&mut state))
    }

    /// Publish a status for `generation`, false if it is stale
    pub fn set_status(&self, generation: u64, transport: TransportKind, status: Status) -> bool {
        let state = self.lock();
        if state.generation != generation || state.manual_disconnect {
            return false;
        }
        self.publish(ConnectionStatus::new(transport, status));
        true
    }

    /// Prepare a fresh socket-first run for `token`.
    ///
    /// Returns `None` when a transport is already connected with the same token, otherwise
    /// tears down the previous transport and calls `spawn` with the new generation.
    pub fn begin(&self, token: &str, spawn: impl FnOnce(u64) -> JoinHandle<()>) -> Option<u64> {
        let mut state = self.lock();

        if !state.manual_disconnect
            && state.token.as_deref() == Some(token)
            && state.task.is_some()
            && self.status().is_connected()
        {
            log::debug!("Already connected with this token, ignore connect request");
            return None;
        }

        if let Some(task) = state.task.take() {
            log::debug!("Abort previous transport task");
            task.abort();
        }

        state.generation += 1;
        state.token = Some(token.to_string());
        state.manual_disconnect = false;
        state.reconnect_attempts = 0;
        state.last_event_cursor = None;
        state.outbound = None;

        self.publish(ConnectionStatus::new(
            TransportKind::Socket,
            Status::Connecting,
        ));

        let generation = state.generation;
        state.task = Some(spawn(generation));

        Some(generation)
    }

    /// Manual teardown, stops the transport and forgets all listeners.
    pub fn teardown(&self) {
        let state = self.lock();
        self.teardown_locked(state, true);
    }

    /// Teardown requested by the transport task of `generation` itself.
    ///
    /// The task is left to finish by itself instead of being aborted.
    pub fn teardown_from(&self, generation: u64) -> bool {
        let state = self.lock();
        if state.generation != generation || state.manual_disconnect {
            return false;
        }
        self.teardown_locked(state, false);
        true
    }

    fn teardown_locked(&self, mut state: MutexGuard<'_, SessionState>, abort: bool) {
        if let Some(task) = state.task.take() {
            if abort {
                log::debug!("Abort transport task");
                task.abort();
            }
        }

        state.generation += 1;
        state.manual_disconnect = true;
        state.token = None;
        state.reconnect_attempts = 0;
        state.last_event_cursor = None;
        state.outbound = None;

        // listeners go while the generation change is still exclusive, so no dispatch
        // can snapshot them afterwards
        let removed = self.dispatcher.take_all();
        self.publish(ConnectionStatus::DISCONNECTED);

        // a listener's drop may call back into the session
        drop(state);
        drop(removed);
    }
}
