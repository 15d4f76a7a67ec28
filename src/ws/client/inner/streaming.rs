use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::{sync::mpsc, time::Instant};

use super::ClientInner;
use crate::{
    session::EventSender,
    ws::message::{Message, MessageStreamSinkError},
};

/// Why streaming stopped
#[derive(Debug)]
pub(crate) enum StreamEnd {
    /// server closed the socket
    Closed,
    /// the socket failed, a close follows
    Broken(MessageStreamSinkError),
    /// session moved on, nothing to recover
    Stale,
}

#[derive(Debug)]
pub(crate) struct ClientStateStreaming<S> {
    pub socket: S,
}

impl<S> ClientInner<ClientStateStreaming<S>>
where
    S: Stream<Item = Result<Message, MessageStreamSinkError>>
        + Sink<Message, Error = MessageStreamSinkError>
        + Send
        + Unpin,
{
    /// Deliver inbound events, send heartbeat and outbound frames, until the socket closes.
    pub async fn streaming(
        mut self,
        sender: &EventSender,
        mut outbound: mpsc::UnboundedReceiver<Message>,
        heartbeat_interval: Duration,
    ) -> StreamEnd {
        log::debug!("Streaming start");

        let socket = &mut self.state.socket;
        let mut send_ping_tick = Instant::now() + heartbeat_interval;

        loop {
            tokio::select! {
                biased;

                result = socket.next() => {
                    match result {
                        None => {
                            log::debug!("Socket stream ended");
                            return StreamEnd::Closed;
                        }
                        Some(Ok(message)) => {
                            log::trace!("Received new {} message", message.type_name());

                            match message {
                                Message::Event(event) => {
                                    if !sender.send_event(event) {
                                        log::debug!("Session moved on, stop");
                                        return StreamEnd::Stale;
                                    }
                                }
                                // heartbeat ack, nothing to deliver
                                Message::Pong => {}
                                Message::Ping => {
                                    log::trace!("Ignore ping from server");
                                }
                            }
                        }
                        Some(Err(err)) if !err.is_fatal() => {
                            log::warn!("Message stream error happened but ignored: {}", err);
                        }
                        Some(Err(err)) => {
                            log::warn!("Find message stream broken when receive message: {}", err);
                            return StreamEnd::Broken(err);
                        }
                    }
                }

                Some(message) = outbound.recv() => {
                    log::trace!("Send {} message", message.type_name());
                    if let Err(err) = socket.send(message).await {
                        log::warn!("Find message stream broken when send message: {}", err);
                        return StreamEnd::Broken(err);
                    }
                }

                _ = tokio::time::sleep_until(send_ping_tick) => {
                    log::trace!("Send heartbeat ping");
                    if let Err(err) = socket.send(Message::Ping).await {
                        log::warn!("Find message stream broken when send ping message: {}", err);
                        return StreamEnd::Broken(err);
                    }

                    send_ping_tick = Instant::now() + heartbeat_interval;
                    log::trace!("Next ping time: {:?}", send_ping_tick);
                }
            }
        }
    }
}
