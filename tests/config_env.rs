// tests/config_env.rs
use std::{env, fs};

use server_relay::config::{RelayConfig, ENV_CONFIG_PATH};

const VARS: [&str; 6] = [
    ENV_CONFIG_PATH,
    "DISCORD_TOKEN",
    "RELAY_QUEUE_CAPACITY",
    "FEED_POLL_INTERVAL_MS",
    "FEED_DATA_FILE",
    "METRICS_ENABLED",
];

fn clear_env() {
    for v in VARS {
        env::remove_var(v);
    }
}

#[serial_test::serial]
#[test]
fn env_path_and_overrides_win() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("relay.toml");
    fs::write(
        &path,
        r#"
[queue]
capacity = 7

[[feed.sources]]
source_id = "100m+"
channel_id = "1429904829177790605"
"#,
    )
    .unwrap();

    env::set_var(ENV_CONFIG_PATH, path.display().to_string());
    let cfg = RelayConfig::load().unwrap();
    assert_eq!(cfg.queue.capacity, 7);
    assert!(!cfg.feed.is_runnable(), "no token yet");

    env::set_var("DISCORD_TOKEN", "  secret  ");
    env::set_var("RELAY_QUEUE_CAPACITY", "12");
    env::set_var("FEED_POLL_INTERVAL_MS", "1500");
    env::set_var("METRICS_ENABLED", "1");
    let cfg = RelayConfig::load().unwrap();
    assert_eq!(cfg.feed.token.as_deref(), Some("secret"));
    assert_eq!(cfg.queue.capacity, 12);
    assert_eq!(cfg.feed.interval_ms, 1500);
    assert!(cfg.metrics_enabled);
    assert!(cfg.feed.is_runnable());
    assert!(server_relay::build_feed_relay(&cfg.feed).is_some());

    clear_env();
}

#[serial_test::serial]
#[test]
fn missing_env_path_is_an_error() {
    clear_env();
    env::set_var(ENV_CONFIG_PATH, "/definitely/not/here/relay.toml");
    assert!(RelayConfig::load().is_err());
    clear_env();
}

#[serial_test::serial]
#[test]
fn zero_capacity_override_is_sanitized() {
    clear_env();
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("relay.toml");
    fs::write(&path, "").unwrap();
    env::set_var(ENV_CONFIG_PATH, path.display().to_string());
    env::set_var("RELAY_QUEUE_CAPACITY", "0");
    let cfg = RelayConfig::load().unwrap();
    assert_eq!(cfg.queue.capacity, 200);
    assert!(server_relay::build_feed_relay(&cfg.feed).is_none());
    clear_env();
}
