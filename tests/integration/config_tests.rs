use clap::Parser;
use dupesweep::actions::DeleteMode;
use dupesweep::cli::Cli;
use dupesweep::config::{Config, ConfigError, ConfigOverrides, RunOptions};
use dupesweep::scanner::HashScope;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config = Config::from_figment(&figment).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.io_threads, 4);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
min_size = 4096
prefix_bytes = 512
io_threads = 2
progress = false
trash = true
"#,
    )
    .unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config.min_size, 4096);
    assert_eq!(config.prefix_bytes, 512);
    assert_eq!(config.io_threads, 2);
    assert!(!config.progress);
    assert!(config.trash);
}

#[test]
fn test_config_zero_threads_rejected() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 0\n").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    let err = Config::from_figment(&figment).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "io_threads", .. }));
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "invalid = toml").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));
    assert!(matches!(
        Config::from_figment(&figment),
        Err(ConfigError::Load(_))
    ));
}

#[test]
fn test_cli_overrides_file() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "prefix_bytes = 512\ntrash = false\n").unwrap();

    let cli = Cli::try_parse_from([
        "dupesweep",
        temp_dir.path().to_str().unwrap(),
        "--prefix-bytes",
        "2048",
        "--fast",
        "--trash",
    ])
    .unwrap();

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .merge(Serialized::defaults(ConfigOverrides::from_cli(&cli)));
    let config = Config::from_figment(&figment).unwrap();
    let options = RunOptions::resolve(&cli, &config).unwrap();

    assert_eq!(options.scope, HashScope::Prefix(2048));
    assert_eq!(options.mode, DeleteMode::Trash);
}
