use super::session::{ConnId, Tx};
use axum::extract::ws::{CloseFrame, Message};
use dashmap::DashMap;
use shared::ServerMessage;

/// All open connections, registered or not. Delivery is fire-and-forget: a
/// recipient whose writer task is gone is skipped and logged, never retried.
#[derive(Default)]
pub struct Connections {
    map: DashMap<ConnId, Tx>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conn: ConnId, tx: Tx) {
        self.map.insert(conn, tx);
    }

    pub fn remove(&self, conn: ConnId) -> bool {
        self.map.remove(&conn).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Serializes once and pushes to every open connection. Returns the
    /// delivered count; per-recipient failures are logged, never raised.
    pub fn broadcast_all(&self, msg: &ServerMessage) -> usize {
        let text = match serde_json::to_string(msg) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize broadcast payload");
                return 0;
            }
        };
        let mut delivered = 0;
        let mut failed = 0;
        for entry in self.map.iter() {
            if entry.value().send(Message::Text(text.clone())).is_ok() {
                delivered += 1;
            } else {
                failed += 1;
            }
        }
        if failed > 0 {
            tracing::warn!(failed, delivered, "broadcast skipped unreachable connections");
        }
        delivered
    }

    /// Best-effort single-target send.
    pub fn send_one(&self, conn: ConnId, msg: &ServerMessage) -> bool {
        let Some(tx) = self.map.get(&conn) else {
            return false;
        };
        let text = match serde_json::to_string(msg) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize payload");
                return false;
            }
        };
        let sent = tx.send(Message::Text(text)).is_ok();
        if !sent {
            tracing::debug!(conn = %conn, "dropped message for closed connection");
        }
        sent
    }

    /// Queues a close frame for one connection.
    pub fn close(&self, conn: ConnId, code: u16, reason: &str) {
        if let Some(tx) = self.map.get(&conn) {
            let _ = tx.send(Message::Close(Some(CloseFrame {
                code,
                reason: reason.to_string().into(),
            })));
        }
    }

    /// Queues a close frame for every connection. Used at shutdown.
    pub fn close_all(&self, code: u16, reason: &str) {
        for entry in self.map.iter() {
            let _ = entry.value().send(Message::Close(Some(CloseFrame {
                code,
                reason: reason.to_string().into(),
            })));
        }
    }
}
