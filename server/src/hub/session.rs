use axum::extract::ws::Message;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle for pushing frames to one connection's writer task.
pub type Tx = mpsc::UnboundedSender<Message>;

/// Server-assigned handle for one WebSocket connection.
pub type ConnId = Uuid;

/// Live binding of an identity to a connection, plus display metadata.
/// Timestamps are epoch milliseconds, matching the wire protocol.
#[derive(Debug, Clone)]
pub struct Session {
    pub name: String,
    pub connected_at: u64,
    pub last_seen: u64,
    pub conn: ConnId,
}

/// Last reported position for an identity. The identity may outlive its
/// connection only until the entry ages past the TTL.
#[derive(Debug, Clone)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub timestamp: u64,
}
