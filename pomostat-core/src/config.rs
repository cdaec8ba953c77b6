//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/pomostat/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/pomostat/` (~/.config/pomostat/)
//! - Data: `$XDG_DATA_HOME/pomostat/` (~/.local/share/pomostat/)
//! - State/Logs: `$XDG_STATE_HOME/pomostat/` (~/.local/state/pomostat/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "pomostat";

/// Upper bound for `stats.top_categories`. Keeps every donut at six
/// slices or fewer, "Other" included.
pub const MAX_TOP_CATEGORIES: usize = 5;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Report presentation settings
    #[serde(default)]
    pub stats: StatsConfig,

    /// Storage location override
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Donut chart settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StatsConfig {
    /// Categories kept before the rest fold into "Other" (1..=5)
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,

    /// Name shown for a category that no longer resolves
    #[serde(default = "default_placeholder_name")]
    pub placeholder_name: String,

    /// Color shown for a category that no longer resolves
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: String,

    /// Color of the "Other" slice
    #[serde(default = "default_other_color")]
    pub other_color: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            top_categories: default_top_categories(),
            placeholder_name: default_placeholder_name(),
            placeholder_color: default_placeholder_color(),
            other_color: default_other_color(),
        }
    }
}

impl StatsConfig {
    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.top_categories == 0 || self.top_categories > MAX_TOP_CATEGORIES {
            return Err(Error::Config(format!(
                "stats.top_categories must be between 1 and {}",
                MAX_TOP_CATEGORIES
            )));
        }
        for (key, color) in [
            ("stats.placeholder_color", &self.placeholder_color),
            ("stats.other_color", &self.other_color),
        ] {
            if !is_hex_color(color) {
                return Err(Error::Config(format!(
                    "{} must be a #rrggbb color, got {:?}",
                    key, color
                )));
            }
        }
        Ok(())
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn default_top_categories() -> usize {
    5
}

fn default_placeholder_name() -> String {
    "Unknown".to_string()
}

fn default_placeholder_color() -> String {
    "#6366f1".to_string()
}

fn default_other_color() -> String {
    "#ffffff".to_string()
}

/// Database location
#[derive(Debug, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Overrides `Config::database_path()`
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.stats.validate()?;
        Ok(config)
    }

    /// Database path to open: the configured override, else the XDG default.
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::database_path)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/pomostat/config.toml` (~/.config/pomostat/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/pomostat/` (~/.local/share/pomostat/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join(APP_DIR)
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/pomostat/` (~/.local/state/pomostat/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/pomostat/data.db` (~/.local/share/pomostat/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/pomostat/pomostat.log` (~/.local/state/pomostat/pomostat.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("pomostat.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// CLI binaries call this before anything reads the XDG paths.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.stats.top_categories, 5);
        assert_eq!(config.stats.placeholder_name, "Unknown");
        assert_eq!(config.stats.placeholder_color, "#6366f1");
        assert_eq!(config.stats.other_color, "#ffffff");
        assert!(config.database.path.is_none());
        assert!(config.stats.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r##"
[logging]
level = "debug"

[stats]
top_categories = 3
other_color = "#cccccc"

[database]
path = "/tmp/pomostat-test.db"
"##;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
        assert_eq!(config.stats.top_categories, 3);
        assert_eq!(config.stats.other_color, "#cccccc");
        assert_eq!(config.stats.placeholder_name, "Unknown");
        assert_eq!(
            config.resolved_database_path(),
            PathBuf::from("/tmp/pomostat-test.db")
        );
    }

    #[test]
    fn test_stats_validation() {
        let config = StatsConfig {
            top_categories: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StatsConfig {
            top_categories: MAX_TOP_CATEGORIES + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StatsConfig {
            other_color: "white".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = StatsConfig {
            top_categories: MAX_TOP_CATEGORIES,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_rejects_invalid_stats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stats]\ntop_categories = 6\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("top_categories"));
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stats\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_default_paths_end_with_app_files() {
        assert!(Config::config_path().ends_with("pomostat/config.toml"));
        assert!(Config::database_path().ends_with("pomostat/data.db"));
        assert!(Config::log_path().ends_with("pomostat/pomostat.log"));
    }
}
