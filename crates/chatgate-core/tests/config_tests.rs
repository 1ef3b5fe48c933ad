//! Integration tests for configuration module

use chatgate_core::config::{Config, DEFAULT_WHITELIST};
use chatgate_core::{Error, WhitelistPolicy};
use std::io::Write;

#[test]
fn test_full_config_file() {
    let config = Config::from_toml(
        r#"
        [whitelist]
        rules = "10.0.0.0/8, 192.168.1.*, localhost"
        enabled = true
        resolve_hostnames = false
        resolve_timeout_ms = 500

        [server]
        bind = "127.0.0.1:9000"

        [generation]
        api_key = "sk-test"
        base_url = "http://127.0.0.1:9999"
        model = "deepseek-reasoner"
        timeout_secs = 5

        [logging]
        level = "debug"
        json_format = true
        "#,
    )
    .expect("Failed to parse");

    assert!(config.validate().is_ok());
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.generation.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.generation.model, "deepseek-reasoner");
    assert!(config.logging.json_format);

    let policy = WhitelistPolicy::from_config(&config.whitelist);
    assert_eq!(policy.rules().len(), 3);
    assert!(policy.is_allowed("10.255.0.1"));
    assert!(policy.is_allowed("192.168.1.20"));
    assert!(policy.is_allowed("0:0:0:0:0:0:0:1"));
    assert!(!policy.is_allowed("172.16.0.1"));
}

#[test]
fn test_disabled_whitelist_from_config() {
    let config = Config::from_toml(
        r#"
        [whitelist]
        enabled = false
        "#,
    )
    .unwrap();

    assert_eq!(config.whitelist.rules, DEFAULT_WHITELIST);
    let policy = WhitelistPolicy::from_config(&config.whitelist);
    assert!(!policy.is_enabled());
    assert!(policy.is_allowed("203.0.113.9"));
}

#[test]
fn test_toml_serialization_roundtrip() {
    let mut original = Config::default();
    original.whitelist.rules = "172.16.0.0/12".to_string();
    original.generation.api_key = Some("sk-roundtrip".to_string());

    let toml_str = original.to_toml().expect("Failed to serialize");
    let parsed = Config::from_toml(&toml_str).expect("Failed to parse");

    assert_eq!(original.whitelist.rules, parsed.whitelist.rules);
    assert_eq!(original.generation.api_key, parsed.generation.api_key);
    assert_eq!(original.server.bind, parsed.server.bind);
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("chatgate-config-{}.toml", std::process::id()));
    {
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[whitelist]\nrules = \"1.2.3.4\"").unwrap();
    }

    let config = Config::load(&path).expect("Failed to load");
    std::fs::remove_file(&path).ok();

    assert_eq!(config.whitelist.rules, "1.2.3.4");
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("chatgate-no-such-config.toml");
    match Config::load(&path) {
        Err(Error::ConfigNotFound { path: shown }) => assert!(shown.contains("chatgate-no-such-config")),
        other => panic!("expected ConfigNotFound, got {other:?}"),
    }
}

#[test]
fn test_load_directory_is_io_error() {
    let dir = std::env::temp_dir();
    match Config::load(&dir) {
        Err(Error::Io(_)) => {}
        other => panic!("expected Io, got {other:?}"),
    }
}
