use super::locations::coords_valid;
use super::session::ConnId;
use super::{epoch_ms, Hub};
use shared::{Coord, ServerMessage};

impl Hub {
    /// `location_update`: registered senders only. Bad coordinates are
    /// rejected without touching the store or broadcasting.
    pub fn handle_location_update(
        &self,
        conn: ConnId,
        user_id: &str,
        lat: &Coord,
        lng: &Coord,
        name: Option<&str>,
    ) {
        if self.registry.identity_of(conn).is_none() {
            self.connections
                .send_one(conn, &ServerMessage::error("Not registered"));
            return;
        }
        let coords = lat
            .as_f64()
            .zip(lng.as_f64())
            .filter(|&(lat, lng)| coords_valid(lat, lng));
        let Some((lat, lng)) = coords else {
            self.connections
                .send_one(conn, &ServerMessage::error("Invalid location data"));
            return;
        };

        let now = epoch_ms();
        // Display name: payload, then session, then whatever the previous
        // update carried.
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| self.registry.name_of(user_id))
            .or_else(|| self.locations.get(user_id).map(|loc| loc.name))
            .unwrap_or_else(|| "Anonymous".to_string());

        self.locations.upsert(user_id, lat, lng, &name, now);
        self.registry.touch(user_id, now);

        let delivered = self.connections.broadcast_all(&ServerMessage::LocationUpdate {
            user_id: user_id.to_string(),
            lat,
            lng,
            name,
            timestamp: now,
        });
        tracing::debug!(user_id = %user_id, delivered, "location update broadcast");
    }

    /// `stop_sharing`: falls back to the caller's own identity when the
    /// payload names none. Removing an absent location is a silent no-op.
    pub fn handle_stop_sharing(&self, conn: ConnId, user_id: Option<&str>) {
        let target = user_id
            .map(str::to_string)
            .or_else(|| self.registry.identity_of(conn));
        let Some(target) = target else {
            return;
        };
        if self.locations.remove(&target).is_some() {
            tracing::info!(user_id = %target, "stopped sharing location");
            self.broadcast_location_stop(&target);
        }
    }

    /// `track_user`: one-off reply to the requester when the target has a
    /// fresh location. A stale or unknown target gets no reply.
    pub fn handle_track_user(&self, conn: ConnId, target: &str) {
        let now = epoch_ms();
        let fresh = self
            .locations
            .get(target)
            .filter(|loc| now.saturating_sub(loc.timestamp) < self.config.location_ttl_ms());
        match fresh {
            Some(loc) => {
                self.connections.send_one(
                    conn,
                    &ServerMessage::LocationUpdate {
                        user_id: target.to_string(),
                        lat: loc.lat,
                        lng: loc.lng,
                        name: loc.name,
                        timestamp: loc.timestamp,
                    },
                );
            }
            None => {
                tracing::debug!(target = %target, "track request for user with no active location");
            }
        }
    }
}
