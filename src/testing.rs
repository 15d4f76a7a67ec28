//! Scripted transports for tests.

use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
    time::Duration,
};

use futures_util::{Sink, Stream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use url::Url;

use crate::{
    api::{
        self,
        types::{redact_token, PollResponse},
        Poller,
    },
    ws::{
        message::decode_text_frame, ConnectGatewayError, Connector, Message,
        MessageStreamSinkError, RealtimeEvent,
    },
    Listener, Session, Subscription,
};

pub(crate) fn init_log() {
    let _ = pretty_env_logger::try_init();
}

/// Socket half handed to the session
#[derive(Debug)]
pub(crate) struct FakeSocket {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<Message>,
}

impl Stream for FakeSocket {
    type Item = Result<Message, MessageStreamSinkError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inbound
            .poll_recv(cx)
            .map(|frame| frame.map(|text| decode_text_frame(&text)))
    }
}

impl Sink<Message> for FakeSocket {
    type Error = MessageStreamSinkError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.outbound
            .send(item)
            .map_err(|_| MessageStreamSinkError::Websocket {
                source: tungstenite::Error::ConnectionClosed,
            })
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Server half kept by the test, dropping it closes the socket
#[derive(Debug)]
pub(crate) struct FakeServer {
    inbound: mpsc::UnboundedSender<String>,
    pub sent: mpsc::UnboundedReceiver<Message>,
}

impl FakeServer {
    pub fn push(&self, frame: serde_json::Value) {
        self.push_raw(&frame.to_string());
    }

    pub fn push_raw(&self, frame: &str) {
        let _ = self.inbound.send(frame.to_string());
    }

    pub async fn next_sent(&mut self) -> Option<Message> {
        tokio::time::timeout(Duration::from_secs(600), self.sent.recv())
            .await
            .ok()
            .flatten()
    }
}

#[derive(Debug, Default)]
struct FakeConnectorInner {
    script: Mutex<VecDeque<Option<FakeSocket>>>,
    urls: Mutex<Vec<Url>>,
}

/// Connector following a script of failures and opened sockets, failing once it is empty
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeConnector {
    inner: Arc<FakeConnectorInner>,
}

impl FakeConnector {
    pub fn fail(&self) -> &Self {
        self.inner.script.lock().unwrap().push_back(None);
        self
    }

    pub fn open(&self) -> FakeServer {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        self.inner.script.lock().unwrap().push_back(Some(FakeSocket {
            inbound: inbound_rx,
            outbound: outbound_tx,
        }));

        FakeServer {
            inbound: inbound_tx,
            sent: outbound_rx,
        }
    }

    pub fn attempts(&self) -> usize {
        self.inner.urls.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<Url> {
        self.inner.urls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Connector for FakeConnector {
    type Socket = FakeSocket;

    async fn connect(&self, url: &Url) -> Result<Self::Socket, ConnectGatewayError> {
        self.inner.urls.lock().unwrap().push(url.clone());

        let socket = self.inner.script.lock().unwrap().pop_front().flatten();
        socket.ok_or_else(|| ConnectGatewayError::Handshake {
            url: redact_token(url),
            source: tungstenite::Error::ConnectionClosed,
        })
    }
}

/// One scripted poll result
#[derive(Debug)]
pub(crate) enum PollReply {
    Events(Vec<serde_json::Value>),
    /// events answered after the server held the request for a while
    Held(Duration, Vec<serde_json::Value>),
    Status(u16),
}

fn poll_response(events: Vec<serde_json::Value>) -> PollResponse {
    PollResponse {
        events: events
            .into_iter()
            .map(|e| serde_json::from_value(e).unwrap())
            .collect(),
        timestamp: None,
    }
}

#[derive(Debug, Default)]
struct FakePollerInner {
    script: Mutex<VecDeque<PollReply>>,
    cursors: Mutex<Vec<Option<String>>>,
}

/// Poller answering from a script, hanging like a held request once it is empty
#[derive(Debug, Clone, Default)]
pub(crate) struct FakePoller {
    inner: Arc<FakePollerInner>,
}

impl FakePoller {
    pub fn reply(&self, reply: PollReply) -> &Self {
        self.inner.script.lock().unwrap().push_back(reply);
        self
    }

    /// cursor sent by each poll request so far
    pub fn cursors(&self) -> Vec<Option<String>> {
        self.inner.cursors.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Poller for FakePoller {
    async fn poll(&self, _token: &str, cursor: Option<&str>) -> api::Result<PollResponse> {
        self.inner
            .cursors
            .lock()
            .unwrap()
            .push(cursor.map(str::to_string));

        let reply = self.inner.script.lock().unwrap().pop_front();
        match reply {
            Some(PollReply::Events(events)) => Ok(poll_response(events)),
            Some(PollReply::Held(delay, events)) => {
                tokio::time::sleep(delay).await;
                Ok(poll_response(events))
            }
            Some(PollReply::Status(code)) => Err(api::Error::HTTPStatusNotOK {
                method: reqwest::Method::GET,
                url: "http://localhost:8000/api/realtime/poll".to_string(),
                status_code: reqwest::StatusCode::from_u16(code).unwrap(),
            }),
            None => std::future::pending().await,
        }
    }
}

/// Subscribe a listener forwarding every event into a channel
pub(crate) fn record<C, P>(
    session: &Session<C, P>,
) -> (Subscription, mpsc::UnboundedReceiver<RealtimeEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let subscription = session.subscribe(Arc::new(move |event: &RealtimeEvent| {
        let _ = tx.send(event.clone());
    }));
    (subscription, rx)
}

/// Listener that always panics
#[derive(Debug)]
pub(crate) struct Panicker;

impl Listener for Panicker {
    fn on_event(&self, _event: &RealtimeEvent) {
        panic!("listener failure")
    }
}
