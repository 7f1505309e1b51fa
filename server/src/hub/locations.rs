use super::session::Location;
use dashmap::DashMap;

/// Returns true when both coordinates are finite and inside WGS84 bounds.
pub fn coords_valid(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Last-known positions keyed by identity. Staleness is filtered lazily at
/// read time; the janitor evicts eagerly.
#[derive(Default)]
pub struct LocationStore {
    entries: DashMap<String, Location>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, identity: &str, lat: f64, lng: f64, name: &str, now: u64) {
        self.entries.insert(
            identity.to_string(),
            Location {
                lat,
                lng,
                name: name.to_string(),
                timestamp: now,
            },
        );
    }

    pub fn remove(&self, identity: &str) -> Option<Location> {
        self.entries.remove(identity).map(|(_, loc)| loc)
    }

    pub fn get(&self, identity: &str) -> Option<Location> {
        self.entries.get(identity).map(|entry| entry.value().clone())
    }

    /// Entries younger than `ttl_ms`, ordered by identity for stable replay.
    pub fn active_snapshot(&self, now: u64, ttl_ms: u64) -> Vec<(String, Location)> {
        let mut active: Vec<(String, Location)> = self
            .entries
            .iter()
            .filter(|entry| now.saturating_sub(entry.timestamp) < ttl_ms)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }

    /// Evicts entries strictly older than `ttl_ms`. Returns how many were
    /// dropped.
    pub fn sweep(&self, now: u64, ttl_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, loc| now.saturating_sub(loc.timestamp) <= ttl_ms);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: u64 = 300_000;

    #[test]
    fn snapshot_returns_exactly_the_fresh_entries() {
        let store = LocationStore::new();
        let now = 1_000_000;
        store.upsert("fresh", 10.0, 20.0, "Fresh", now - 1);
        store.upsert("edge", 10.0, 20.0, "Edge", now - TTL);
        store.upsert("stale", 10.0, 20.0, "Stale", now - TTL - 1);

        let ids: Vec<String> = store
            .active_snapshot(now, TTL)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["fresh"]);
    }

    #[test]
    fn sweep_evicts_only_past_ttl() {
        let store = LocationStore::new();
        let now = 1_000_000;
        store.upsert("fresh", 10.0, 20.0, "Fresh", now);
        store.upsert("edge", 10.0, 20.0, "Edge", now - TTL);
        store.upsert("stale", 10.0, 20.0, "Stale", now - TTL - 1);

        assert_eq!(store.sweep(now, TTL), 1);
        assert_eq!(store.len(), 2);
        assert!(store.get("stale").is_none());
    }

    #[test]
    fn coordinate_bounds() {
        assert!(coords_valid(-90.0, 180.0));
        assert!(coords_valid(0.0, 0.0));
        assert!(!coords_valid(95.0, 0.0));
        assert!(!coords_valid(0.0, -180.5));
        assert!(!coords_valid(f64::NAN, 0.0));
        assert!(!coords_valid(0.0, f64::INFINITY));
    }
}
