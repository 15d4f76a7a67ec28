mod gateway;
mod streaming;

pub(crate) use gateway::ClientStateGateway;
pub(crate) use streaming::{ClientStateStreaming, StreamEnd};

#[derive(Debug)]
pub(crate) struct ClientInner<S> {
    pub state: S,
}
