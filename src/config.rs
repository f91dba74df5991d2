//! Configuration system for envbot
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (ENVBOT_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::{BudgetPolicy, EnvKeys, DEFAULT_BUDGET_KEY, DEFAULT_IDENTITY_KEY};

/// Main envbot configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvbotConfig {
    /// Access list storage
    pub store: StoreSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Where and how the access list is stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Env file holding the access list
    pub env_file: String,

    /// Key of the comma-separated identity list
    pub identity_key: String,

    /// Key of the comma-separated budget list
    pub budget_key: String,

    /// Require budgets to be non-negative numbers
    pub strict_budgets: bool,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            env_file: ".env".to_string(),
            identity_key: DEFAULT_IDENTITY_KEY.to_string(),
            budget_key: DEFAULT_BUDGET_KEY.to_string(),
            strict_budgets: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_files: 5,
            json_format: false,
        }
    }
}

impl StoreSettings {
    pub fn env_keys(&self) -> EnvKeys {
        EnvKeys {
            identity: self.identity_key.clone(),
            budget: self.budget_key.clone(),
        }
    }

    pub fn budget_policy(&self) -> BudgetPolicy {
        BudgetPolicy::from_strict(self.strict_budgets)
    }

    pub fn env_file_path(&self) -> PathBuf {
        PathBuf::from(&self.env_file)
    }
}

impl EnvbotConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            return if path.exists() {
                Ok(Some(path))
            } else {
                Err(Error::ConfigNotFound { path })
            };
        }

        let search_paths = [
            Some(PathBuf::from("envbot.toml")),
            dirs::config_dir().map(|p| p.join("envbot").join("config.toml")),
            dirs::home_dir().map(|p| p.join(".envbot").join("config.toml")),
            Some(PathBuf::from("/etc/envbot/config.toml")),
        ];

        for path in search_paths.into_iter().flatten() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ENVBOT_ENV_FILE") {
            self.store.env_file = val;
        }
        if let Ok(val) = std::env::var("ENVBOT_IDENTITY_KEY") {
            self.store.identity_key = val;
        }
        if let Ok(val) = std::env::var("ENVBOT_BUDGET_KEY") {
            self.store.budget_key = val;
        }
        if let Ok(val) = std::env::var("ENVBOT_STRICT_BUDGETS") {
            self.store.strict_budgets = parse_bool(&val);
        }

        if let Ok(val) = std::env::var("ENVBOT_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("ENVBOT_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("ENVBOT_LOG_JSON") {
            self.logging.json_format = parse_bool(&val);
        }
    }

    /// Override the env file location (from `--env-file`)
    pub fn set_env_file(&mut self, path: &str) {
        self.store.env_file = expand_path(path);
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.store.env_file = expand_path(&self.store.env_file);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.env_file.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "store.env_file",
                "env_file cannot be empty",
            ));
        }

        for (field, key) in [
            ("store.identity_key", &self.store.identity_key),
            ("store.budget_key", &self.store.budget_key),
        ] {
            if key.is_empty() || key.contains('=') || key.chars().any(char::is_whitespace) {
                return Err(Error::config_field_invalid(
                    field,
                    format!("'{}' is not a usable env key", key),
                ));
            }
        }
        if self.store.identity_key == self.store.budget_key {
            return Err(Error::config_validation(
                "identity_key and budget_key must differ",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }
}

fn parse_bool(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".envbot")
                .join("config.toml")
        });

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
    }

    fs::write(&config_path, generate_default_config())
        .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    format!(
        r#"# envbot configuration

[store]
# Env file holding the access list (also read by the bot itself)
env_file = ".env"

# Key of the comma-separated list of allowed identities
identity_key = "{identity}"

# Key of the comma-separated list of budgets, aligned with identity_key
budget_key = "{budget}"

# Reject budgets that are not non-negative numbers
strict_budgets = false

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.envbot/logs/envbot.log"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#,
        identity = DEFAULT_IDENTITY_KEY,
        budget = DEFAULT_BUDGET_KEY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EnvbotConfig::default();
        assert_eq!(config.store.env_file, ".env");
        assert_eq!(config.store.identity_key, "ALLOWED_TELEGRAM_USER_IDS");
        assert_eq!(config.store.budget_key, "USER_BUDGETS");
        assert_eq!(config.store.budget_policy(), BudgetPolicy::Opaque);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override() {
        env::set_var("ENVBOT_BUDGET_KEY", "LIMITS");
        env::set_var("ENVBOT_STRICT_BUDGETS", "1");

        let mut config = EnvbotConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.store.budget_key, "LIMITS");
        assert!(config.store.strict_budgets);

        env::remove_var("ENVBOT_BUDGET_KEY");
        env::remove_var("ENVBOT_STRICT_BUDGETS");
    }

    #[test]
    fn test_validation_rejects_bad_keys() {
        let mut config = EnvbotConfig::default();
        config.store.budget_key = config.store.identity_key.clone();
        assert!(config.validate().is_err());

        let mut config = EnvbotConfig::default();
        config.store.identity_key = "MY KEY".to_string();
        assert!(config.validate().is_err());

        let mut config = EnvbotConfig::default();
        config.store.budget_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_level() {
        let mut config = EnvbotConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_path_expansion() {
        let mut config = EnvbotConfig::default();
        config.store.env_file = "~/bot/.env".to_string();
        config.expand_paths();
        assert!(!config.store.env_file.contains('~'));
    }

    #[test]
    fn test_parse_config_file() {
        let config: EnvbotConfig = toml::from_str(
            r#"
[store]
env_file = "/srv/bot/.env"
strict_budgets = true

[logging]
level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.store.env_file, "/srv/bot/.env");
        assert_eq!(config.store.identity_key, "ALLOWED_TELEGRAM_USER_IDS");
        assert_eq!(
            config.store.budget_policy(),
            BudgetPolicy::NonNegativeDecimal
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: EnvbotConfig = toml::from_str(&generate_default_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.budget_key, "USER_BUDGETS");
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("envbot.toml");
        let path_str = path.to_str().unwrap();

        assert_eq!(init_config(Some(path_str), false).unwrap(), path);
        assert!(init_config(Some(path_str), false).is_err());
        assert!(init_config(Some(path_str), true).is_ok());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = EnvbotConfig::load(Some("/nonexistent/envbot.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }
}
