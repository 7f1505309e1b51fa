use super::session::{ConnId, Session};
use dashmap::DashMap;
use shared::UserEntry;

/// Identity-keyed session table plus the connection → identity bindings.
/// The binding table is the single source of truth for "who is this
/// socket"; the transport layer never carries identity itself.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
    bindings: DashMap<ConnId, String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `conn` to `identity` and creates or overwrites the session.
    /// An identity re-registered from a new connection steals the session;
    /// the previous connection's binding is dropped so its eventual
    /// disconnect cannot tear the new session down.
    pub fn upsert(&self, identity: &str, name: &str, conn: ConnId, now: u64) {
        let previous = self.sessions.insert(
            identity.to_string(),
            Session {
                name: name.to_string(),
                connected_at: now,
                last_seen: now,
                conn,
            },
        );
        if let Some(old) = previous {
            if old.conn != conn {
                self.bindings.remove(&old.conn);
            }
        }
        self.bindings.insert(conn, identity.to_string());
    }

    pub fn identity_of(&self, conn: ConnId) -> Option<String> {
        self.bindings.get(&conn).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.contains_key(identity)
    }

    pub fn name_of(&self, identity: &str) -> Option<String> {
        self.sessions.get(identity).map(|entry| entry.name.clone())
    }

    pub fn touch(&self, identity: &str, now: u64) {
        if let Some(mut session) = self.sessions.get_mut(identity) {
            session.last_seen = now;
        }
    }

    /// Removes the binding for `conn`. If the bound identity's session still
    /// belongs to this connection the session goes too and the identity is
    /// returned for follow-up cleanup. Calling twice is a no-op.
    pub fn unbind(&self, conn: ConnId) -> Option<String> {
        let (_, identity) = self.bindings.remove(&conn)?;
        let owned = self
            .sessions
            .get(&identity)
            .map(|session| session.conn == conn)
            .unwrap_or(false);
        if owned {
            self.sessions.remove(&identity);
            Some(identity)
        } else {
            None
        }
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Current users, ordered by registration time (identity as tie-break)
    /// so listings are stable.
    pub fn snapshot(&self) -> Vec<UserEntry> {
        let mut users: Vec<UserEntry> = self
            .sessions
            .iter()
            .map(|entry| UserEntry {
                user_id: entry.key().clone(),
                name: entry.name.clone(),
                connected_at: entry.connected_at,
            })
            .collect();
        users.sort_by(|a, b| {
            a.connected_at
                .cmp(&b.connected_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        users
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn snapshot_orders_by_registration_time() {
        let registry = SessionRegistry::new();
        registry.upsert("b", "Bob", Uuid::new_v4(), 200);
        registry.upsert("a", "Alice", Uuid::new_v4(), 100);
        registry.upsert("c", "Carol", Uuid::new_v4(), 200);

        let ids: Vec<String> = registry.snapshot().into_iter().map(|u| u.user_id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn reregistration_steals_the_session_from_the_old_connection() {
        let registry = SessionRegistry::new();
        let old_conn = Uuid::new_v4();
        let new_conn = Uuid::new_v4();

        registry.upsert("a", "Alice", old_conn, 100);
        registry.upsert("a", "Alice", new_conn, 200);

        assert_eq!(registry.identity_of(old_conn), None);
        assert_eq!(registry.identity_of(new_conn).as_deref(), Some("a"));

        // The old connection's disconnect must not remove the live session.
        assert_eq!(registry.unbind(old_conn), None);
        assert_eq!(registry.count(), 1);

        assert_eq!(registry.unbind(new_conn).as_deref(), Some("a"));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn unbind_is_idempotent() {
        let registry = SessionRegistry::new();
        let conn = Uuid::new_v4();
        registry.upsert("a", "Alice", conn, 100);

        assert_eq!(registry.unbind(conn).as_deref(), Some("a"));
        assert_eq!(registry.unbind(conn), None);
    }
}
