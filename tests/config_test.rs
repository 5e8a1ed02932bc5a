//! Configuration loading from YAML files

use nodescout::config::Config;
use nodescout::store::StoreKind;
use std::time::Duration;
use tempfile::tempdir;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_config_file_loading() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nodescout.yaml");

    let config_content = r#"
remote:
  base_url: "https://automation.example.com"
  timeout: 2500
discovery:
  batch:
    batch_size: 20
    concurrency: 4
    inter_window_delay: 250
  include_registry: false
cache:
  max_size: 200
  default_ttl: 900
  enable_predictive_warming: false
selector:
  score_threshold: 0.4
  min_count: 3
  max_count: 12
store:
  kind: json
  path: "/var/lib/nodescout/state.json"
"#;
    std::fs::write(&config_path, config_content).unwrap();

    let config = assert_ok!(Config::load(Some(config_path.as_path())));

    assert_eq!(config.remote.base_url, "https://automation.example.com");
    assert_eq!(config.remote.timeout, Duration::from_millis(2500));
    assert_eq!(config.discovery.batch.batch_size, 20);
    assert_eq!(config.discovery.batch.concurrency, 4);
    assert_eq!(config.discovery.batch.inter_window_delay, Duration::from_millis(250));
    assert!(!config.discovery.include_registry);
    assert_eq!(config.cache.max_size, 200);
    assert_eq!(config.cache.default_ttl, Duration::from_secs(900));
    assert!(!config.cache.enable_predictive_warming);
    assert_eq!(config.selector.max_count, 12);
    assert_eq!(config.store.kind, StoreKind::Json);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let temp_dir = tempdir().unwrap();
    let config = assert_ok!(Config::load(Some(temp_dir.path().join("absent.yaml").as_path())));
    assert_eq!(config.remote.base_url, "http://localhost:5678");
}

#[test]
fn test_invalid_file_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nodescout.yaml");

    std::fs::write(&config_path, "selector:\n  min_count: 10\n  max_count: 2\n").unwrap();
    assert_err!(Config::load(Some(config_path.as_path())));

    std::fs::write(&config_path, "store:\n  kind: json\n").unwrap();
    assert_err!(Config::load(Some(config_path.as_path())));

    std::fs::write(&config_path, "cache: [not, a, map]\n").unwrap();
    assert_err!(Config::load(Some(config_path.as_path())));
}
