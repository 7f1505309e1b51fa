use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub mod broadcast;
pub mod handlers;
pub mod janitor;
pub mod lifecycle;
pub mod locations;
pub mod rate_limit;
pub mod registry;
pub mod session;

pub use session::{ConnId, Tx};

use crate::config::HubConfig;
use broadcast::Connections;
use locations::LocationStore;
use rate_limit::RateLimiter;
use registry::SessionRegistry;

/// Milliseconds since the UNIX epoch; the hub's wire clock.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Shared state for one hub instance, handed to connection tasks and the
/// janitor behind an `Arc`. Each store serializes its own mutations; no
/// handler holds a lock across an await point.
pub struct Hub {
    pub connections: Connections,
    pub registry: SessionRegistry,
    pub locations: LocationStore,
    pub rate: RateLimiter,
    pub config: HubConfig,
    started: Instant,
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Connections::new(),
            registry: SessionRegistry::new(),
            locations: LocationStore::new(),
            rate: RateLimiter::new(config.rate_window_ms, config.rate_max),
            config,
            started: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
