use serde::Deserialize;

use crate::ring::DEFAULT_RING_CAPACITY;
use crate::stores::DEFAULT_HISTORY_CAPACITY;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
}

/// Local read-only API for the presentation layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// Upstream live endpoint, e.g. "ws://monitor.lan:8080/ws/live".
    pub url: String,
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    /// Trace targets subscribed at startup.
    #[serde(default)]
    pub targets: Vec<String>,
    /// Agents whose process traffic is subscribed at startup.
    #[serde(default)]
    pub agents: Vec<String>,
}

fn default_reconnect_base_ms() -> u64 {
    1000
}

fn default_reconnect_max_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_ring_capacity")]
    pub ring_capacity: usize,
    #[serde(default = "default_traffic_history_capacity")]
    pub traffic_history_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ring_capacity: default_ring_capacity(),
            traffic_history_capacity: default_traffic_history_capacity(),
        }
    }
}

fn default_ring_capacity() -> usize {
    DEFAULT_RING_CAPACITY
}

fn default_traffic_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Invalidation signals kept for /ws/invalidations (slow clients may lag).
    #[serde(default = "default_invalidation_capacity")]
    pub invalidation_capacity: usize,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            invalidation_capacity: default_invalidation_capacity(),
        }
    }
}

fn default_invalidation_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (connection status, traces, traffic agents) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.stream.url.starts_with("ws://") || self.stream.url.starts_with("wss://"),
            "stream.url must start with ws:// or wss://, got {:?}",
            self.stream.url
        );
        anyhow::ensure!(
            self.stream.reconnect_base_ms > 0,
            "stream.reconnect_base_ms must be > 0, got {}",
            self.stream.reconnect_base_ms
        );
        anyhow::ensure!(
            self.stream.reconnect_max_ms >= self.stream.reconnect_base_ms,
            "stream.reconnect_max_ms must be >= stream.reconnect_base_ms, got {} < {}",
            self.stream.reconnect_max_ms,
            self.stream.reconnect_base_ms
        );
        anyhow::ensure!(
            self.store.ring_capacity > 0,
            "store.ring_capacity must be > 0, got {}",
            self.store.ring_capacity
        );
        anyhow::ensure!(
            self.store.traffic_history_capacity > 0,
            "store.traffic_history_capacity must be > 0, got {}",
            self.store.traffic_history_capacity
        );
        anyhow::ensure!(
            self.publishing.invalidation_capacity > 0,
            "publishing.invalidation_capacity must be > 0, got {}",
            self.publishing.invalidation_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
