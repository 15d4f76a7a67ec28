use std::{sync::Arc, time::Duration};

use snafu::prelude::*;
use url::Url;

use super::{streaming::ClientStateStreaming, ClientInner};
use crate::{
    api::types::redact_token,
    ws::client::{connector::error, ConnectGatewayError, Connector},
};

#[derive(Debug)]
pub(crate) struct ClientStateGateway<C> {
    pub connector: Arc<C>,
    pub url: Url,
}

impl<C: Connector> ClientInner<ClientStateGateway<C>> {
    pub async fn connect(
        self,
        timeout: Duration,
    ) -> Result<ClientInner<ClientStateStreaming<C::Socket>>, ConnectGatewayError> {
        let u = redact_token(&self.state.url);

        log::debug!("Connecting gateway: {}", u);

        let connecting = self.state.connector.connect(&self.state.url);
        let socket = match tokio::time::timeout(timeout, connecting).await {
            Ok(result) => result?,
            Err(_) => return error::Timeout { url: u }.fail(),
        };

        log::debug!("Move to streaming state");

        Ok(ClientInner {
            state: ClientStateStreaming { socket },
        })
    }
}
