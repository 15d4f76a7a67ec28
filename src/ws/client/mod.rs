mod connector;
mod inner;

pub use connector::{ConnectGatewayError, Connector, WebsocketConnector};
pub(crate) use inner::StreamEnd;

use std::{sync::Arc, time::Duration};

use tokio_tungstenite as websocket;
use url::Url;

use inner::{ClientInner, ClientStateGateway, ClientStateStreaming};

pub(crate) type WebsocketClient =
    websocket::WebSocketStream<websocket::MaybeTlsStream<tokio::net::TcpStream>>;

/// Socket transport client for one connection attempt.
///
/// `Client::connect` opens the socket, the returned [ClientInner] streams until it closes.
#[derive(Debug)]
pub(crate) struct Client<C> {
    inner: ClientInner<ClientStateGateway<C>>,
}

impl<C: Connector> Client<C> {
    pub fn new(connector: Arc<C>, url: Url) -> Self {
        Self {
            inner: ClientInner {
                state: ClientStateGateway { connector, url },
            },
        }
    }

    /// open the socket, giving up after `timeout`
    pub async fn connect(
        self,
        timeout: Duration,
    ) -> Result<ClientInner<ClientStateStreaming<C::Socket>>, ConnectGatewayError> {
        self.inner.connect(timeout).await
    }
}
