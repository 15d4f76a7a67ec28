//! Realtime socket transport

mod client;
mod event;
pub(crate) mod message;

pub use client::{ConnectGatewayError, Connector, WebsocketConnector};
pub use event::{EventType, Payload, RealtimeEvent};
pub use message::{Message, MessageStreamSink, MessageStreamSinkError, ParseMessageError};

pub(crate) use client::{Client, StreamEnd};
