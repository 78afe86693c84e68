use serde::{Deserialize, Serialize};

/// Main configuration structure for roost
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session snapshot configuration
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Pagination defaults for list reads
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Local raw-record source used by the CLI
    #[serde(default)]
    pub fixtures: FixturesConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// File rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Session snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotConfig {
    /// Whether the store is restored/saved at session boundaries
    #[serde(default = "default_snapshot_enabled")]
    pub enabled: bool,

    /// Path of the JSON snapshot file
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

const fn default_snapshot_enabled() -> bool {
    true
}

fn default_snapshot_path() -> String {
    ".roost/snapshot.json".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_snapshot_enabled(),
            path: default_snapshot_path(),
        }
    }
}

/// Pagination defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PaginationConfig {
    /// Page size used when the caller does not give one
    #[serde(default = "default_page_limit")]
    pub default_limit: u64,
}

const fn default_page_limit() -> u64 {
    10
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
        }
    }
}

/// Local raw-record source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixturesConfig {
    /// JSON file holding an array of raw property records
    #[serde(default = "default_fixtures_path")]
    pub path: String,
}

fn default_fixtures_path() -> String {
    ".roost/properties.json".to_string()
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            path: default_fixtures_path(),
        }
    }
}
