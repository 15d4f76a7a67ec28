//! Connection session: owns the transports of one login and the listeners they feed.

mod driver;
mod sender;
mod shared;
mod status;

pub(crate) use sender::EventSender;
pub use status::{ConnectionStatus, Status, TransportKind};

use std::sync::Arc;

use snafu::prelude::*;
use tokio::sync::watch;

use crate::{
    api::{self, Poller},
    dispatcher::Subscription,
    error,
    filter::{Filter, Filtered},
    subscriber::Listener,
    ws::{Connector, Message, RealtimeEvent, WebsocketConnector},
    Config, Result,
};
use driver::Driver;
use shared::Shared;

/// Realtime connection session.
///
/// `connect` starts the socket transport (falling back to long polling when the socket
/// keeps failing), `subscribe` registers listeners for delivered events, `disconnect`
/// stops everything. Dropping the session disconnects it.
///
/// Transport tasks are spawned on the current tokio runtime.
pub struct Session<C = WebsocketConnector, P = api::Client> {
    config: Arc<Config>,
    connector: Arc<C>,
    poller: Arc<P>,
    shared: Arc<Shared>,
}

impl<C, P> std::fmt::Debug for Session<C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("shared", &self.shared)
            .finish()
    }
}

impl Session {
    /// Create a session using websocket and http transports
    pub fn new(config: Config) -> Result<Self> {
        let poller = api::Client::new(config.api_base.clone(), config.request_timeout)
            .context(error::CreatePollerFailed)?;

        log::info!("Create realtime session success");

        Ok(Self::with_transports(config, WebsocketConnector, poller))
    }

    /// Create a session using [Config::from_env]
    pub fn from_env() -> Result<Self> {
        Self::new(Config::from_env().context(error::LoadConfigFailed)?)
    }
}

impl<C, P> Session<C, P>
where
    C: Connector,
    P: Poller + 'static,
{
    /// Create a session with custom transports
    pub fn with_transports(config: Config, connector: C, poller: P) -> Self {
        Self {
            config: Arc::new(config),
            connector: Arc::new(connector),
            poller: Arc::new(poller),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Start receiving events with `token`.
    ///
    /// No-op when already connected with the same token. Otherwise any running transport
    /// and pending reconnect is cancelled and a fresh socket attempt starts.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn connect<S: AsRef<str> + ?Sized>(&self, token: &S) {
        let token = token.as_ref();

        let started = self.shared.begin(token, |generation| {
            let driver = Driver {
                sender: EventSender::new(self.shared.clone(), generation),
                config: self.config.clone(),
                connector: self.connector.clone(),
                poller: self.poller.clone(),
                token: token.to_string(),
            };
            tokio::spawn(driver.run())
        });

        if let Some(generation) = started {
            log::info!("Connecting realtime session, generation {}", generation);
        }
    }
}

impl<C, P> Session<C, P> {
    /// Stop the transport, cancel pending reconnect and drop all listeners.
    ///
    /// Safe to call in any state, any number of times.
    pub fn disconnect(&self) {
        log::info!("Disconnect realtime session");
        self.shared.teardown();
    }

    /// Current transport and status, never blocks
    pub fn status(&self) -> ConnectionStatus {
        self.shared.status()
    }

    /// Watch status transitions
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.watch_status()
    }

    /// Socket reconnect attempts since last open
    pub fn reconnect_attempts(&self) -> u32 {
        self.shared.lock().reconnect_attempts
    }

    /// Id of the last event delivered by long polling
    pub fn last_event_cursor(&self) -> Option<String> {
        self.shared.lock().last_event_cursor.clone()
    }

    /// Send an event over the socket.
    ///
    /// Only works while connected by socket, otherwise the event is logged and dropped.
    pub fn send(&self, event: RealtimeEvent) {
        let status = self.status();
        let state = self.shared.lock();

        let outbound = match (&state.outbound, status) {
            (
                Some(outbound),
                ConnectionStatus {
                    transport: TransportKind::Socket,
                    status: Status::Connected,
                },
            ) => outbound,
            _ => {
                log::warn!(
                    "Cannot send {} event: not connected via socket",
                    event.r#type
                );
                return;
            }
        };

        if outbound.send(Message::Event(event)).is_err() {
            log::warn!("Cannot send event: socket is closing");
        }
    }

    /// Register a listener, see [Dispatcher::subscribe](crate::Dispatcher::subscribe)
    pub fn subscribe<L: Listener + 'static>(&self, listener: Arc<L>) -> Subscription {
        self.shared.dispatcher.subscribe(listener)
    }

    /// Register a listener that only receives events passing `filter`
    pub fn subscribe_filtered<F, L>(&self, filter: F, listener: L) -> Subscription
    where
        F: Filter + Send + Sync + 'static,
        L: Listener + 'static,
    {
        self.subscribe(Arc::new(Filtered::new(filter, listener)))
    }
}

impl<C, P> Drop for Session<C, P> {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}
