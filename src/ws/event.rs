//! Realtime events carried by both the socket and the polling transport.

use serde::{Deserialize, Serialize};

/// Event payload type
pub type Payload = serde_json::Value;

/// A realtime event, `{type, payload}` on the wire.
///
/// The event is handed to listeners exactly as received: the `type` string is not
/// normalized and the payload is not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// event type name, see [EventType] for the known ones
    pub r#type: String,

    /// event body, shape differs for each type
    #[serde(default)]
    pub payload: Payload,

    /// optional event id, some servers put it beside the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

impl RealtimeEvent {
    /// Create a new event with given type name and payload
    pub fn new<S: Into<String>>(r#type: S, payload: Payload) -> Self {
        Self {
            r#type: r#type.into(),
            payload,
            id: None,
        }
    }

    /// Classify the type name
    pub fn event_type(&self) -> EventType {
        EventType::from_type_name(&self.r#type)
    }

    /// Transport-internal heartbeat events, never delivered to listeners
    pub fn is_control(&self) -> bool {
        self.event_type().is_control()
    }

    /// The cursor this event advances the polling transport to.
    ///
    /// Top-level `id` wins over `payload.id`. String and integer ids are accepted.
    pub fn cursor(&self) -> Option<String> {
        self.id
            .as_ref()
            .and_then(id_to_string)
            .or_else(|| self.payload.get("id").and_then(id_to_string))
    }
}

fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Known event types.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    /// a new chat message
    MessageCreated,
    /// an image finished uploading
    ImageUploaded,
    /// a room was created
    RoomCreated,
    /// a room was changed
    RoomUpdated,
    /// a room was removed
    RoomDeleted,
    /// a user profile or presence changed
    UserUpdated,
    /// a user came online or registered
    UserJoined,
    /// a user went offline
    UserLeft,
    /// heartbeat probe, client -> server
    Ping,
    /// heartbeat acknowledgement, server -> client
    Pong,
    /// anything else, still delivered
    Unknown,
}

impl EventType {
    /// Parse a wire type name.
    ///
    /// Hyphenated (`message-created`) and upper snake (`NEW_MESSAGE`) spellings are both accepted.
    pub fn from_type_name(name: &str) -> Self {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "message-created" | "new-message" => Self::MessageCreated,
            "image-uploaded" => Self::ImageUploaded,
            "room-created" => Self::RoomCreated,
            "room-updated" | "room-update" => Self::RoomUpdated,
            "room-deleted" => Self::RoomDeleted,
            "user-updated" | "user-update" => Self::UserUpdated,
            "user-joined" => Self::UserJoined,
            "user-left" => Self::UserLeft,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            _ => Self::Unknown,
        }
    }

    /// canonical type name
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageCreated => "message-created",
            Self::ImageUploaded => "image-uploaded",
            Self::RoomCreated => "room-created",
            Self::RoomUpdated => "room-updated",
            Self::RoomDeleted => "room-deleted",
            Self::UserUpdated => "user-updated",
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Unknown => "unknown",
        }
    }

    /// ping and pong
    pub fn is_control(&self) -> bool {
        matches!(self, Self::Ping | Self::Pong)
    }
}
