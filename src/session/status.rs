use serde::Serialize;

/// Transport carrying events right now
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportKind {
    /// persistent socket
    Socket,
    /// long polling loop
    Polling,
    /// no transport
    None,
}

/// Connection status
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// transport is being opened
    Connecting,
    /// transport is open and delivering events
    Connected,
    /// no connection, initial and terminal state
    Disconnected,
    /// last transport attempt failed, recovery may be in progress
    Error,
}

/// Snapshot returned by [Session::status](super::Session::status)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ConnectionStatus {
    /// active transport
    #[serde(rename = "type")]
    pub transport: TransportKind,
    /// status of that transport
    pub status: Status,
}

impl ConnectionStatus {
    /// `(NONE, DISCONNECTED)`
    pub const DISCONNECTED: Self = Self::new(TransportKind::None, Status::Disconnected);

    /// Create a snapshot
    pub const fn new(transport: TransportKind, status: Status) -> Self {
        Self { transport, status }
    }

    /// true when events are flowing
    pub fn is_connected(&self) -> bool {
        self.status == Status::Connected
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::DISCONNECTED
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_shape() {
        let status = ConnectionStatus::new(TransportKind::Polling, Status::Connected);
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({"type": "POLLING", "status": "CONNECTED"})
        );
        assert_eq!(
            serde_json::to_value(ConnectionStatus::default()).unwrap(),
            json!({"type": "NONE", "status": "DISCONNECTED"})
        );
    }
}
