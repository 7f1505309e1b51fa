use super::session::{ConnId, Tx};
use super::{epoch_ms, Hub};
use shared::{close, ServerMessage};

impl Hub {
    /// Tracks a fresh connection and greets it. The caller owns the
    /// registration timeout; until `register` succeeds the connection is
    /// anonymous but already receives broadcasts.
    pub fn add_connection(&self, conn: ConnId, tx: Tx) {
        self.connections.insert(conn, tx);
        tracing::info!(conn = %conn, open = self.connections.len(), "connection opened");
        self.connections.send_one(
            conn,
            &ServerMessage::Welcome {
                message: "Connected to location hub".to_string(),
            },
        );
    }

    /// Handles a `register` request. Returns false when the connection was
    /// closed for capacity and the socket task should wind down.
    pub fn register(&self, conn: ConnId, user_id: &str, name: Option<&str>) -> bool {
        if self.registry.identity_of(conn).is_some() {
            self.connections
                .send_one(conn, &ServerMessage::error("Already registered"));
            return true;
        }
        if self.registry.count() >= self.config.max_sessions && !self.registry.contains(user_id) {
            tracing::warn!(
                user_id = %user_id,
                max = self.config.max_sessions,
                "rejecting registration, hub at capacity"
            );
            self.connections
                .send_one(conn, &ServerMessage::error("Server is at capacity"));
            self.connections
                .close(conn, close::CAPACITY, "Server is at capacity");
            return false;
        }

        let now = epoch_ms();
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Anonymous");
        self.registry.upsert(user_id, name, conn, now);
        tracing::info!(user_id = %user_id, name = %name, "user registered");

        self.connections.send_one(
            conn,
            &ServerMessage::RegistrationSuccess {
                user_id: user_id.to_string(),
            },
        );
        self.broadcast_user_list();

        // Replay the active snapshot so the newcomer can render everyone
        // immediately.
        let ttl = self.config.location_ttl_ms();
        for (identity, loc) in self.locations.active_snapshot(now, ttl) {
            self.connections.send_one(
                conn,
                &ServerMessage::LocationUpdate {
                    user_id: identity,
                    lat: loc.lat,
                    lng: loc.lng,
                    name: loc.name,
                    timestamp: loc.timestamp,
                },
            );
        }
        true
    }

    /// Tears down a closed connection. Safe to call more than once; only
    /// the first call for a registered identity broadcasts anything.
    pub fn disconnect(&self, conn: ConnId) {
        self.connections.remove(conn);
        let Some(identity) = self.registry.unbind(conn) else {
            return;
        };
        tracing::info!(user_id = %identity, "user disconnected");
        if self.locations.remove(&identity).is_some() {
            self.broadcast_location_stop(&identity);
        }
        self.broadcast_user_list();
    }

    pub fn broadcast_user_list(&self) {
        let delivered = self.connections.broadcast_all(&ServerMessage::UserList {
            users: self.registry.snapshot(),
            timestamp: epoch_ms(),
        });
        tracing::debug!(delivered, "user list broadcast");
    }

    pub(crate) fn broadcast_location_stop(&self, identity: &str) {
        self.connections.broadcast_all(&ServerMessage::LocationStop {
            user_id: identity.to_string(),
            timestamp: epoch_ms(),
        });
    }

    /// Queues a going-away close frame on every connection. The janitor
    /// task is aborted separately by the caller.
    pub fn shutdown(&self) {
        tracing::info!(open = self.connections.len(), "closing all connections for shutdown");
        self.connections
            .close_all(close::GOING_AWAY, "Server shutting down");
    }
}
