//! Configuration loading tests

use shortener::config::{CliArgs, CodePolicyKind, StaticConfig};
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> String {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");
    let config = StaticConfig::load(Some(path.to_str().unwrap())).unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.shortener.base_url, "http://localhost:8080");
    assert_eq!(config.codes.max_attempts, 8);
    assert!(config.storage.file_path.is_none());
}

#[test]
fn test_file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[shortener]
base_url = "https://sho.rt"
trusted_subnet = "172.16.0.0/12"

[codes]
policy = "random"
random_length = 6

[pool]
workers = 3
queue_capacity = 16
"#,
    );

    let config = StaticConfig::load(Some(&path)).unwrap();
    assert_eq!(config.shortener.base_url, "https://sho.rt");
    assert_eq!(config.codes.policy, CodePolicyKind::Random);
    assert_eq!(config.codes.random_length, 6);
    assert_eq!(config.codes.batch_code_length, 10);
    assert_eq!(config.pool.workers, 3);
    assert_eq!(config.pool.queue_capacity, 16);
    assert_eq!(config.identity.cookie_name, "user_id");
    assert!(config.validate().is_ok());
}

#[test]
fn test_flags_override_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[server]
host = "127.0.0.1"
port = 8080

[shortener]
base_url = "https://from-file.example"
"#,
    );

    let args = CliArgs {
        config: Some(path),
        server_address: Some("0.0.0.0:9090".to_string()),
        base_url: Some("https://from-flag.example".to_string()),
        ..CliArgs::default()
    };
    let config = StaticConfig::from_args(&args).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.shortener.base_url, "https://from-flag.example");
}

#[test]
fn test_invalid_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[pool]\nqueue_capacity = 0\n");

    let args = CliArgs {
        config: Some(path),
        ..CliArgs::default()
    };
    assert!(StaticConfig::from_args(&args).is_err());

    let args = CliArgs {
        trusted_subnet: Some("not-a-cidr".to_string()),
        ..CliArgs::default()
    };
    let mut config = StaticConfig::default();
    config.apply_args(&args).unwrap();
    assert!(config.validate().is_err());
}
