//! Socket frame types.

mod stream;

pub use stream::{MessageStreamSink, MessageStreamSinkError};

pub(crate) use stream::decode_text_frame;

use enum_as_inner::EnumAsInner;
use snafu::prelude::*;

use super::event::{EventType, RealtimeEvent};

/// Error when parse text frame as message
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)), module(error), context(suffix(false)))]
pub enum ParseMessageError {
    /// data is invalid json
    #[snafu(display("parse json failed: {source}"))]
    ParseJSONFailed {
        /// data for decode
        data: String,
        /// source error
        source: serde_json::Error,
    },

    /// data json is not an object
    #[snafu(display("parsed message is not object: {json}"))]
    MessageNotObject {
        /// json string
        json: String,
    },

    /// data json has no type field
    #[snafu(display("message has no type field: {json}"))]
    NoMessageType {
        /// json string
        json: String,
    },

    /// data json type field is not a string
    #[snafu(display("message has non-string type field: {json}"))]
    MessageTypeNotString {
        /// json string
        json: String,
    },

    /// data json is not a valid event
    #[snafu(display("parse to {type_name} event failed: {source}"))]
    ParseJSONToEventFailed {
        /// type name
        type_name: String,
        /// source error
        source: serde_json::Error,
    },
}

/// Socket protocol message
#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Message {
    /// Heartbeat probe, client -> server
    Ping,
    /// Heartbeat acknowledgement, server -> client
    Pong,
    /// Realtime event, mostly server -> client
    Event(RealtimeEvent),
}

impl Message {
    /// Decode a text frame to a message
    pub fn decode(data: &str) -> Result<Self, ParseMessageError> {
        let value: serde_json::Value =
            serde_json::from_str(data).context(error::ParseJSONFailed { data })?;

        let obj = value
            .as_object()
            .with_context(|| error::MessageNotObject { json: data })?;

        let type_name = obj
            .get("type")
            .with_context(|| error::NoMessageType { json: data })?
            .as_str()
            .with_context(|| error::MessageTypeNotString { json: data })?;

        match EventType::from_type_name(type_name) {
            EventType::Ping => Ok(Self::Ping),
            EventType::Pong => Ok(Self::Pong),
            _ => {
                let type_name = type_name.to_string();
                serde_json::from_value(value)
                    .map(Self::Event)
                    .context(error::ParseJSONToEventFailed { type_name })
            }
        }
    }

    /// Encode message to a text frame
    pub fn encode(&self) -> String {
        match self {
            Self::Ping => r#"{"type":"ping"}"#.to_string(),
            Self::Pong => r#"{"type":"pong"}"#.to_string(),
            // a struct of String and Value always serializes
            Self::Event(event) => serde_json::to_string(event).unwrap_or_default(),
        }
    }

    /// get type name
    pub fn type_name(&self) -> &str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Event(event) => &event.r#type,
        }
    }
}

#[cfg(test)]
mod test {
    mod decode {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn test_message_decode_pong() {
            let msg = Message::decode(r#"{"type":"pong"}"#).unwrap();
            assert!(matches!(msg, Message::Pong));
        }

        #[test]
        fn test_message_decode_ping() {
            let msg = Message::decode(r#"{"type":"ping"}"#).unwrap();
            assert!(matches!(msg, Message::Ping));
        }

        #[test]
        fn test_message_decode_event() {
            let data = json!({
                "type": "message-created",
                "payload": {
                    "id": "m1",
                    "roomId": "r1",
                    "content": "hello",
                },
            })
            .to_string();

            let msg = Message::decode(&data).unwrap();

            let event = msg.into_event().unwrap();
            assert_eq!(event.r#type, "message-created");
            assert_eq!(
                event.payload,
                json!({"id": "m1", "roomId": "r1", "content": "hello"})
            );
        }

        #[test]
        fn test_message_decode_event_without_payload() {
            let msg = Message::decode(r#"{"type":"USER_LEFT"}"#).unwrap();
            let event = msg.into_event().unwrap();
            assert_eq!(event.payload, serde_json::Value::Null);
        }

        #[test]
        fn test_message_decode_invalid_json() {
            let err = Message::decode("{not json").unwrap_err();
            assert!(matches!(err, ParseMessageError::ParseJSONFailed { .. }));
        }

        #[test]
        fn test_message_decode_not_object() {
            let err = Message::decode("[1, 2]").unwrap_err();
            assert!(matches!(err, ParseMessageError::MessageNotObject { .. }));
        }

        #[test]
        fn test_message_decode_no_type() {
            let err = Message::decode(r#"{"payload":{}}"#).unwrap_err();
            assert!(matches!(err, ParseMessageError::NoMessageType { .. }));

            let err = Message::decode(r#"{"type":3}"#).unwrap_err();
            assert!(matches!(err, ParseMessageError::MessageTypeNotString { .. }));
        }
    }

    mod encode {
        use super::super::*;
        use serde_json::json;

        #[test]
        fn test_message_encode_ping() {
            let value: serde_json::Value = serde_json::from_str(&Message::Ping.encode()).unwrap();
            assert_eq!(value, json!({"type": "ping"}));
        }

        #[test]
        fn test_message_encode_event() {
            let msg = Message::Event(RealtimeEvent::new("typing", json!({"roomId": "r1"})));
            let value: serde_json::Value = serde_json::from_str(&msg.encode()).unwrap();
            assert_eq!(value, json!({"type": "typing", "payload": {"roomId": "r1"}}));
        }
    }
}
