use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

fn get_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

/// Tunables for one hub instance. Compiled defaults, overridable through
/// `HUB_*` environment variables.
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub addr: SocketAddr,
    /// Upper bound on concurrently registered identities.
    pub max_sessions: usize,
    /// How long a connection may stay unregistered before it is dropped.
    pub registration_timeout: Duration,
    /// Sliding window for per-identity rate limiting.
    pub rate_window_ms: u64,
    /// Accepted messages per identity per window.
    pub rate_max: usize,
    /// Age at which a location stops being broadcast and becomes evictable.
    pub location_ttl: Duration,
    /// How often the janitor sweeps stale state.
    pub sweep_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_sessions: 100,
            registration_timeout: Duration::from_secs(30),
            rate_window_ms: 1000,
            rate_max: 10,
            location_ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl HubConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            addr: get_env("HUB_ADDR", defaults.addr),
            max_sessions: get_env("HUB_MAX_SESSIONS", defaults.max_sessions),
            registration_timeout: Duration::from_secs(get_env(
                "HUB_REGISTRATION_TIMEOUT_SECS",
                defaults.registration_timeout.as_secs(),
            )),
            rate_window_ms: get_env("HUB_RATE_WINDOW_MS", defaults.rate_window_ms),
            rate_max: get_env("HUB_RATE_MAX", defaults.rate_max),
            location_ttl: Duration::from_secs(get_env(
                "HUB_LOCATION_TTL_SECS",
                defaults.location_ttl.as_secs(),
            )),
            sweep_interval: Duration::from_secs(get_env(
                "HUB_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )),
        }
    }

    pub fn location_ttl_ms(&self) -> u64 {
        self.location_ttl.as_millis() as u64
    }
}
