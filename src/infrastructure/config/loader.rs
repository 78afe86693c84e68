use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Snapshot path cannot be empty while snapshots are enabled")]
    EmptySnapshotPath,

    #[error("Invalid default_limit: {0}. Must be at least 1")]
    InvalidPageLimit(u64),

    #[error("Fixtures path cannot be empty")]
    EmptyFixturesPath,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .roost/config.yaml (project config)
    /// 3. .roost/local.yaml (local overrides, optional)
    /// 4. Environment variables (ROOST_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".roost/config.yaml"))
            .merge(Yaml::file(".roost/local.yaml"))
            .merge(Env::prefixed("ROOST_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honoring `ROOST_*`
    /// overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("ROOST_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        if config.snapshot.enabled && config.snapshot.path.trim().is_empty() {
            return Err(ConfigError::EmptySnapshotPath);
        }

        if config.pagination.default_limit == 0 {
            return Err(ConfigError::InvalidPageLimit(config.pagination.default_limit));
        }

        if config.fixtures.path.trim().is_empty() {
            return Err(ConfigError::EmptyFixturesPath);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.snapshot.path, ".roost/snapshot.json");
        assert_eq!(config.pagination.default_limit, 10);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
logging:
  level: debug
  format: json
snapshot:
  enabled: false
pagination:
  default_limit: 25
fixtures:
  path: /tmp/listings.json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.rotation, "daily");
        assert!(!config.snapshot.enabled);
        assert_eq!(config.pagination.default_limit, 25);
        assert_eq!(config.fixtures.path, "/tmp/listings.json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "verbose"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_uppercase_log_level() {
        let mut config = Config::default();
        config.logging.level = "WARN".to_string();

        ConfigLoader::validate(&config).expect("log level check should ignore case");
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn test_validate_invalid_rotation() {
        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRotation(_))
        ));
    }

    #[test]
    fn test_validate_empty_snapshot_path_only_when_enabled() {
        let mut config = Config::default();
        config.snapshot.path = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptySnapshotPath)
        ));

        config.snapshot.enabled = false;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_page_limit() {
        let mut config = Config::default();
        config.pagination.default_limit = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidPageLimit(0))
        ));
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  level: warn\npagination:\n  default_limit: 5").unwrap();
        file.flush().unwrap();

        temp_env::with_var("ROOST_PAGINATION__DEFAULT_LIMIT", Some("40"), || {
            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.logging.level, "warn");
            assert_eq!(config.pagination.default_limit, 40, "env should win over file");
        });
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pagination:\n  default_limit: 0").unwrap();
        file.flush().unwrap();

        assert!(ConfigLoader::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(base_file, "logging:\n  level: info\n  format: json").unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
