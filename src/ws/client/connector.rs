use futures_util::{Sink, Stream};
use snafu::prelude::*;
use tokio_tungstenite as websocket;
use url::Url;

use crate::{
    api::types::redact_token,
    ws::message::{Message, MessageStreamSink, MessageStreamSinkError},
};

/// Error when open a realtime socket
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ConnectGatewayError {
    /// websocket handshake failed, `url` has its token masked
    #[snafu(display("connect ws gateway {url} failed: {source}"))]
    Handshake {
        /// connected url
        url: String,
        /// source error
        source: websocket::tungstenite::Error,
    },

    /// handshake did not finish in time
    #[snafu(display("connect ws gateway {url} timeout"))]
    Timeout {
        /// connected url
        url: String,
    },
}

/// Opens realtime sockets.
///
/// The socket is a stream of decoded inbound [Message]s and a sink of outbound ones.
/// A stream end or a fatal stream error means the socket is closed.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    /// opened socket type
    type Socket: Stream<Item = Result<Message, MessageStreamSinkError>>
        + Sink<Message, Error = MessageStreamSinkError>
        + Send
        + Unpin
        + 'static;

    /// Open a socket to `url`
    async fn connect(&self, url: &Url) -> Result<Self::Socket, ConnectGatewayError>;
}

/// [Connector] over tokio-tungstenite
#[derive(Debug, Default, Clone, Copy)]
pub struct WebsocketConnector;

#[async_trait::async_trait]
impl Connector for WebsocketConnector {
    type Socket = MessageStreamSink;

    async fn connect(&self, url: &Url) -> Result<Self::Socket, ConnectGatewayError> {
        let (ws, response) = websocket::connect_async(url)
            .await
            .with_context(|_| error::Handshake {
                url: redact_token(url),
            })?;

        log::trace!("Handshake response status: {}", response.status());

        Ok(MessageStreamSink::new(ws))
    }
}
