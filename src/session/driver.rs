use std::sync::Arc;

use tokio::sync::mpsc;

use super::{EventSender, Status, TransportKind};
use crate::{
    api::{types::SocketURLInfo, worker::PollWorker, Poller},
    backoff::ReconnectPolicy,
    ws::{Client, Connector, StreamEnd},
    Config,
};

/// Transport selector of one session generation.
///
/// Runs the socket transport with reconnect backoff, then downgrades to long polling for
/// the rest of the generation once socket attempts run out.
#[derive(Debug)]
pub(crate) struct Driver<C, P> {
    pub sender: EventSender,
    pub config: Arc<Config>,
    pub connector: Arc<C>,
    pub poller: Arc<P>,
    pub token: String,
}

/// How a socket phase ended
#[derive(Debug, PartialEq, Eq)]
enum SocketPhase {
    Exhausted,
    Stale,
}

impl<C, P> Driver<C, P>
where
    C: Connector,
    P: Poller + 'static,
{
    pub async fn run(self) {
        log::debug!("Transport task start");

        if self.run_socket().await == SocketPhase::Stale {
            log::debug!("Transport task stop");
            return;
        }

        if self.config.enable_polling_fallback {
            log::info!("Falling back to long polling");

            PollWorker::new(
                self.sender.clone(),
                self.poller.clone(),
                self.token.clone(),
                &self.config,
            )
            .run()
            .await;
        } else {
            log::error!("Max socket reconnection attempts reached, polling fallback disabled");
            self.sender.set_status(TransportKind::None, Status::Error);
        }

        log::debug!("Transport task stop");
    }

    async fn run_socket(&self) -> SocketPhase {
        let mut policy = ReconnectPolicy::from_config(&self.config);

        let url = match SocketURLInfo::new(self.config.ws_base.clone(), &self.token).url() {
            Ok(url) => url,
            Err(err) => {
                log::error!("Can't build socket url, skip socket transport: {}", err);
                if !self.sender.set_status(TransportKind::Socket, Status::Error) {
                    return SocketPhase::Stale;
                }
                return SocketPhase::Exhausted;
            }
        };

        loop {
            if !self
                .sender
                .set_status(TransportKind::Socket, Status::Connecting)
            {
                return SocketPhase::Stale;
            }

            let client = Client::new(self.connector.clone(), url.clone());

            match client.connect(self.config.request_timeout).await {
                Ok(connected) => {
                    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

                    policy.reset();
                    if !self.sender.socket_opened(outbound_tx) {
                        return SocketPhase::Stale;
                    }

                    log::info!("Socket connected");

                    let end = connected
                        .streaming(&self.sender, outbound_rx, self.config.heartbeat())
                        .await;

                    match end {
                        StreamEnd::Stale => return SocketPhase::Stale,
                        StreamEnd::Closed => log::info!("Socket closed"),
                        StreamEnd::Broken(err) => log::warn!("Socket broken: {}", err),
                    }

                    if !self.sender.socket_closed() {
                        return SocketPhase::Stale;
                    }
                }
                Err(err) => {
                    log::warn!("Open socket failed: {}", err);
                }
            }

            match policy.record_failure() {
                Some(delay) => {
                    if !self.sender.set_attempts(policy.attempts())
                        || !self.sender.set_status(TransportKind::Socket, Status::Error)
                    {
                        return SocketPhase::Stale;
                    }

                    log::info!(
                        "Reconnect socket ({}/{}) in {:?}",
                        policy.attempts(),
                        policy.max_attempts(),
                        delay
                    );

                    tokio::time::sleep(delay).await;
                }
                None => {
                    log::warn!(
                        "Socket failed {} times, give up socket for this session",
                        policy.attempts()
                    );

                    policy.reset();
                    if !self.sender.set_attempts(0) {
                        return SocketPhase::Stale;
                    }
                    return SocketPhase::Exhausted;
                }
            }
        }
    }
}
