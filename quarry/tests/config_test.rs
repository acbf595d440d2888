//! Tests for config module

use quarry::config::{expand_tilde, Config, ConnectionConfig, DEFAULT_CONNECTION};
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_default_config() {
    let config = Config::default();

    let default = config.connection(DEFAULT_CONNECTION).unwrap();
    assert_eq!(default.hosts, vec!["http://127.0.0.1:9200".to_string()]);
    assert_eq!(default.max_connections, 50);
    assert_eq!(default.timeout_secs, 2.0);
    assert_eq!(config.logging.level, "info,quarry=debug");
    assert_eq!(config.logging.format, "pretty");
}

#[test]
fn test_expand_tilde() {
    let home = dirs::home_dir().unwrap();

    let expanded = expand_tilde(&PathBuf::from("~/foo")).unwrap();
    assert_eq!(expanded, home.join("foo"));

    let expanded = expand_tilde(&PathBuf::from("~")).unwrap();
    assert_eq!(expanded, home);

    let expanded = expand_tilde(&PathBuf::from("/absolute/path")).unwrap();
    assert_eq!(expanded, PathBuf::from("/absolute/path"));
}

#[test]
fn test_load_from_missing_dir_uses_defaults() {
    let temp = tempdir().unwrap();
    let config = Config::load_from(temp.path()).unwrap();
    assert!(config.connections.contains_key(DEFAULT_CONNECTION));
}

#[test]
fn test_load_from_partial_file() {
    let temp = tempdir().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
[connections.search]
hosts = ["http://es-1:9200", "http://es-2:9200"]

[logging]
format = "json"
"#,
    )
    .unwrap();

    let config = Config::load_from(temp.path()).unwrap();
    let search = config.connection("search").unwrap();
    assert_eq!(search.hosts.len(), 2);
    assert_eq!(search.max_connections, 50);
    assert_eq!(search.timeout_secs, 2.0);
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.logging.level, "info,quarry=debug");
}

#[test]
fn test_log_file_tilde_is_expanded() {
    let temp = tempdir().unwrap();
    std::fs::write(
        temp.path().join("config.toml"),
        r#"
[logging]
file = "~/logs/quarry.log"
"#,
    )
    .unwrap();

    let config = Config::load_from(temp.path()).unwrap();
    let home = dirs::home_dir().unwrap();
    assert_eq!(config.logging.file, Some(home.join("logs/quarry.log")));
    assert_eq!(Config::default().logging.file, None);
}

#[test]
fn test_save_and_load() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("config.toml");

    let mut config = Config::default();
    config.connections.insert(
        "analytics".to_string(),
        ConnectionConfig {
            hosts: vec!["http://10.0.0.5:9200".to_string()],
            max_connections: 8,
            timeout_secs: 0.5,
        },
    );
    config.logging.level = "debug".to_string();
    config.save(&config_path).unwrap();

    let loaded = Config::load_or_create(&config_path).unwrap();
    assert_eq!(loaded.connection("analytics").unwrap().max_connections, 8);
    assert_eq!(loaded.connection("analytics").unwrap().timeout_secs, 0.5);
    assert_eq!(loaded.logging.level, "debug");
}

#[test]
fn test_load_or_create_writes_defaults() {
    let temp = tempdir().unwrap();
    let config_path = temp.path().join("nested/config.toml");

    Config::load_or_create(&config_path).unwrap();
    assert!(config_path.exists());
}

#[test]
fn test_env_overrides_default_hosts() {
    let vars: HashMap<&str, &str> = [("ELASTICSEARCH_HOST", "http://a:9200, http://b:9200")]
        .into_iter()
        .collect();

    let mut config = Config::default();
    config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));

    assert_eq!(
        config.connection(DEFAULT_CONNECTION).unwrap().hosts,
        vec!["http://a:9200".to_string(), "http://b:9200".to_string()]
    );
}

#[test]
fn test_env_prefers_quarry_var() {
    let vars: HashMap<&str, &str> = [
        ("QUARRY_ES_HOST", "http://quarry:9200"),
        ("ELASTICSEARCH_HOST", "http://legacy:9200"),
    ]
    .into_iter()
    .collect();

    let mut config = Config::default();
    config.apply_env_from(|key| vars.get(key).map(|v| v.to_string()));
    assert_eq!(
        config.connection(DEFAULT_CONNECTION).unwrap().hosts,
        vec!["http://quarry:9200".to_string()]
    );
}

#[test]
fn test_unknown_connection_is_config_error() {
    let config = Config::default();
    let err = config.connection("missing").unwrap_err();
    assert_eq!(err.error_type(), "config");

    let mut config = Config::default();
    config
        .connections
        .get_mut(DEFAULT_CONNECTION)
        .unwrap()
        .hosts
        .clear();
    assert!(config.connection(DEFAULT_CONNECTION).is_err());
}
