use std::task::Poll;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use snafu::prelude::*;
use tokio_tungstenite::tungstenite as websocket;

use super::{Message, ParseMessageError};
use crate::ws::client::WebsocketClient;

/// Error when read/write message stream/sink
#[derive(Debug, Snafu)]
#[snafu(module(error), context(suffix(false)))]
pub enum MessageStreamSinkError {
    /// underlying websocket stream broken
    #[snafu(display("underlying websocket stream broken: {source}"))]
    Websocket {
        /// source error
        source: websocket::Error,
    },

    /// received a binary frame that is not utf-8 text
    #[snafu(display("received a non-text frame"))]
    NotTextFrame,

    /// parse text message data failed
    #[snafu(display("parse frame to message failed: {source}"))]
    ParseMessageFailed {
        /// source error
        source: ParseMessageError,
    },
}

impl MessageStreamSinkError {
    /// Check if this error will make the stream/sink stop
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Websocket { .. } => true,
            Self::NotTextFrame => false,
            Self::ParseMessageFailed { .. } => false,
        }
    }
}

pub(crate) fn decode_text_frame(text: &str) -> Result<Message, MessageStreamSinkError> {
    Message::decode(text).map_err(|e| {
        log::trace!("Parse failed message data: {}", text);
        MessageStreamSinkError::ParseMessageFailed { source: e }
    })
}

/// Realtime socket message stream/sink over a websocket connection
#[derive(Debug)]
pub struct MessageStreamSink {
    ws: WebsocketClient,
}

impl MessageStreamSink {
    /// Construct a new stream with underlying websocket connection.
    pub fn new(ws: WebsocketClient) -> Self {
        Self { ws }
    }
}

impl Stream for MessageStreamSink {
    type Item = Result<Message, MessageStreamSinkError>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        loop {
            let frame = match self.ws.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Ready(Some(frame)) => frame.context(error::Websocket)?,
            };

            let result = match frame {
                websocket::Message::Text(text) => decode_text_frame(&text),
                websocket::Message::Binary(data) => match std::str::from_utf8(&data) {
                    Ok(text) => decode_text_frame(text),
                    Err(_) => Err(MessageStreamSinkError::NotTextFrame),
                },
                websocket::Message::Close(frame) => {
                    log::debug!("Received close frame: {:?}", frame);
                    return Poll::Ready(None);
                }
                // protocol level ping/pong is answered by tungstenite itself
                _ => continue,
            };

            return Poll::Ready(Some(result));
        }
    }
}

impl Sink<Message> for MessageStreamSink {
    type Error = MessageStreamSinkError;

    fn poll_ready(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_ready_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn start_send(mut self: std::pin::Pin<&mut Self>, item: Message) -> Result<(), Self::Error> {
        self.ws
            .start_send_unpin(websocket::Message::Text(item.encode()))
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_flush_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }

    fn poll_close(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Result<(), Self::Error>> {
        self.ws
            .poll_close_unpin(cx)
            .map_err(|e| Self::Error::Websocket { source: e })
    }
}
