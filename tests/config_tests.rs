// Config loading and validation tests

use pathwatch::config::AppConfig;

const VALID_CONFIG: &str = r#"
[server]
port = 8090
host = "127.0.0.1"

[stream]
url = "ws://monitor.lan:8080/ws/live"
reconnect_base_ms = 1000
reconnect_max_ms = 30000
targets = ["t1", "t2"]
agents = ["a1"]

[store]
ring_capacity = 3600
traffic_history_capacity = 60

[publishing]
invalidation_capacity = 64

[monitoring]
stats_log_interval_secs = 60
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8090);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.stream.url, "ws://monitor.lan:8080/ws/live");
    assert_eq!(config.stream.targets, vec!["t1", "t2"]);
    assert_eq!(config.stream.agents, vec!["a1"]);
    assert_eq!(config.store.ring_capacity, 3600);
    assert_eq!(config.store.traffic_history_capacity, 60);
    assert_eq!(config.publishing.invalidation_capacity, 64);
    assert_eq!(config.monitoring.stats_log_interval_secs, 60);
}

#[test]
fn test_config_optional_sections_default() {
    let minimal = r#"
[server]
port = 8090
host = "127.0.0.1"

[stream]
url = "wss://monitor.example.com/ws/live"

[monitoring]
stats_log_interval_secs = 30
"#;
    let config = AppConfig::load_from_str(minimal).expect("minimal config");
    assert_eq!(config.stream.reconnect_base_ms, 1000);
    assert_eq!(config.stream.reconnect_max_ms, 30_000);
    assert!(config.stream.targets.is_empty());
    assert!(config.stream.agents.is_empty());
    assert_eq!(config.store.ring_capacity, 3600);
    assert_eq!(config.store.traffic_history_capacity, 60);
    assert_eq!(config.publishing.invalidation_capacity, 64);
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8090", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_host() {
    let bad = VALID_CONFIG.replace("host = \"127.0.0.1\"", "host = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.host"));
}

#[test]
fn test_config_validation_rejects_http_stream_url() {
    let bad = VALID_CONFIG.replace("ws://monitor.lan", "http://monitor.lan");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stream.url"));
}

#[test]
fn test_config_validation_rejects_reconnect_base_zero() {
    let bad = VALID_CONFIG.replace("reconnect_base_ms = 1000", "reconnect_base_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("reconnect_base_ms"));
}

#[test]
fn test_config_validation_rejects_max_below_base() {
    let bad = VALID_CONFIG.replace("reconnect_max_ms = 30000", "reconnect_max_ms = 500");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("reconnect_max_ms"));
}

#[test]
fn test_config_validation_rejects_ring_capacity_zero() {
    let bad = VALID_CONFIG.replace("ring_capacity = 3600", "ring_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("ring_capacity"));
}

#[test]
fn test_config_validation_rejects_traffic_history_zero() {
    let bad = VALID_CONFIG.replace(
        "traffic_history_capacity = 60",
        "traffic_history_capacity = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("traffic_history_capacity"));
}

#[test]
fn test_config_validation_rejects_invalidation_capacity_zero() {
    let bad = VALID_CONFIG.replace("invalidation_capacity = 64", "invalidation_capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("invalidation_capacity"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace(
        "stats_log_interval_secs = 60",
        "stats_log_interval_secs = 0",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_missing_stream_section_fails() {
    let bad = VALID_CONFIG.replace("[stream]", "[upstream]");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_load_from_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    let config = AppConfig::load_from_path(path.to_str().unwrap()).expect("load_from_path");
    assert_eq!(config.server.port, 8090);
}

#[test]
fn test_config_load_from_missing_path_names_file() {
    let err = AppConfig::load_from_path("/nonexistent/pathwatch.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/pathwatch.toml"));
}
