use dashmap::DashMap;

/// Sliding-window admission control, one window of epoch-ms timestamps per
/// identity.
pub struct RateLimiter {
    windows: DashMap<String, Vec<u64>>,
    window_ms: u64,
    max_per_window: usize,
}

impl RateLimiter {
    pub fn new(window_ms: u64, max_per_window: usize) -> Self {
        Self {
            windows: DashMap::new(),
            window_ms,
            max_per_window,
        }
    }

    /// Admits or rejects one request at `now`. A rejected request is not
    /// recorded, so hammering a full window does not extend it.
    pub fn allow(&self, identity: &str, now: u64) -> bool {
        let mut stamps = self.windows.entry(identity.to_string()).or_default();
        stamps.retain(|&t| now.saturating_sub(t) < self.window_ms);
        if stamps.len() >= self.max_per_window {
            false
        } else {
            stamps.push(now);
            true
        }
    }

    /// Drops aged-out timestamps and forgets identities whose window
    /// emptied, so the map does not grow without bound under churn.
    pub fn sweep(&self, now: u64) {
        self.windows.retain(|_, stamps| {
            stamps.retain(|&t| now.saturating_sub(t) < self.window_ms);
            !stamps.is_empty()
        });
    }

    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_max_within_the_window() {
        let limiter = RateLimiter::new(1000, 10);
        let accepted = (0..11).filter(|i| limiter.allow("a", 100 + i)).count();
        assert_eq!(accepted, 10);

        // The window slides: once the oldest stamps age out, new requests go
        // through again.
        assert!(limiter.allow("a", 1200));
    }

    #[test]
    fn identities_do_not_share_windows() {
        let limiter = RateLimiter::new(1000, 1);
        assert!(limiter.allow("a", 0));
        assert!(!limiter.allow("a", 1));
        assert!(limiter.allow("b", 1));
    }

    #[test]
    fn rejected_requests_are_not_recorded() {
        let limiter = RateLimiter::new(1000, 2);
        assert!(limiter.allow("a", 0));
        assert!(limiter.allow("a", 1));
        // Burst of rejects at the end of the window.
        for t in 2..999 {
            assert!(!limiter.allow("a", t));
        }
        // Both accepted stamps age out at 1001; the rejects left no trace.
        assert!(limiter.allow("a", 1001));
    }

    #[test]
    fn sweep_forgets_idle_identities() {
        let limiter = RateLimiter::new(1000, 10);
        assert!(limiter.allow("a", 0));
        assert!(limiter.allow("b", 900));
        limiter.sweep(1500);
        assert_eq!(limiter.tracked(), 1);
        limiter.sweep(2500);
        assert_eq!(limiter.tracked(), 0);
    }
}
