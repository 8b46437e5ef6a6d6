use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ManifestError, ManifestResult};

/// Configuration for gunsmith.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Bare `DISCORD_KEY` / `BUNGIE_KEY` environment variables
/// 3. Environment variables (GUNSMITH_* prefix)
/// 4. Config file (~/.config/gunsmith/config.toml)
/// 5. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token.
    ///
    /// Can be set via:
    /// - ENV: DISCORD_KEY or GUNSMITH_DISCORD_KEY
    /// - Config: discord_key = "..."
    pub discord_key: Option<String>,

    /// Bungie.net API key, sent as `X-API-Key`.
    ///
    /// Can be set via:
    /// - ENV: BUNGIE_KEY or GUNSMITH_BUNGIE_KEY
    /// - Config: bungie_key = "..."
    pub bungie_key: Option<String>,

    /// Directory holding downloaded manifests and their roll indexes.
    ///
    /// Default: ~/.local/share/gunsmith/manifests
    #[serde(default = "default_manifest_dir")]
    pub manifest_dir: PathBuf,

    /// Manifest content language.
    #[serde(default = "default_language")]
    pub language: String,

    /// Message prefix the bot answers to.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Hours between manifest refreshes.
    #[serde(default = "default_update_interval_hours")]
    pub update_interval_hours: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_true")]
    pub coloured: bool,

    /// Include file and line of the log call.
    #[serde(default)]
    pub report_caller: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            coloured: true,
            report_caller: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_key: None,
            bungie_key: None,
            manifest_dir: default_manifest_dir(),
            language: default_language(),
            command_prefix: default_command_prefix(),
            update_interval_hours: default_update_interval_hours(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/gunsmith/config.toml
    /// Reads environment variables with GUNSMITH_ prefix, then the bare
    /// `DISCORD_KEY` and `BUNGIE_KEY` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("gunsmith");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config.with_env_keys(|name| std::env::var(name).ok()))
    }

    /// Apply the bare `DISCORD_KEY` / `BUNGIE_KEY` variables on top.
    ///
    /// Empty values are ignored.
    #[must_use]
    pub fn with_env_keys(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(key) = lookup("DISCORD_KEY") {
            self.discord_key = Some(key);
        }
        if let Some(key) = lookup("BUNGIE_KEY") {
            self.bungie_key = Some(key);
        }
        self
    }

    /// Load configuration with a custom manifest directory.
    ///
    /// This is used when the --manifest-dir CLI flag is provided.
    pub fn load_with_manifest_dir(manifest_dir: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.manifest_dir = manifest_dir;
        Ok(config)
    }

    pub fn discord_key(&self) -> ManifestResult<&str> {
        non_empty(self.discord_key.as_deref()).ok_or(ManifestError::MissingKey("DISCORD_KEY"))
    }

    pub fn bungie_key(&self) -> ManifestResult<&str> {
        non_empty(self.bungie_key.as_deref()).ok_or(ManifestError::MissingKey("BUNGIE_KEY"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Get the default manifest directory.
///
/// Returns: ~/.local/share/gunsmith/manifests (or platform equivalent)
fn default_manifest_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gunsmith")
        .join("manifests")
}

fn default_language() -> String {
    "en".to_string()
}

fn default_command_prefix() -> String {
    "!gunsmith".to_string()
}

const fn default_update_interval_hours() -> u64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/gunsmith/config.toml
/// - macOS: ~/Library/Application Support/gunsmith/config.toml
/// - Windows: %APPDATA%\gunsmith\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gunsmith")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Gunsmith Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. DISCORD_KEY / BUNGIE_KEY environment variables
# 3. Environment variables (GUNSMITH_* prefix)
# 4. This config file
# 5. Built-in defaults (lowest priority)

# Discord bot token
#
# Can also be set via:
# - Environment: DISCORD_KEY=your-token-here
discord_key = "your-discord-bot-token-here"

# Bungie.net API key, used to download the Destiny 2 manifest
#
# Register an application at: https://www.bungie.net/en/Application
#
# Can also be set via:
# - Environment: BUNGIE_KEY=your-key-here
bungie_key = "your-bungie-api-key-here"

# Where downloaded manifests and roll indexes are kept
#
# Default: Platform-specific data directory
#manifest_dir = "/path/to/manifests"

# Manifest content language
#language = "en"

# Prefix the bot answers to
#command_prefix = "!gunsmith"

# Hours between manifest refreshes
#update_interval_hours = 24

[logging]
# error, warn, info, debug or trace
level = "info"
coloured = true
report_caller = false
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.manifest_dir.as_os_str().is_empty());
        assert!(config.discord_key.is_none());
        assert_eq!(config.language, "en");
        assert_eq!(config.command_prefix, "!gunsmith");
        assert_eq!(config.update_interval_hours, 24);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_bare_env_keys_take_precedence() {
        let config = Config {
            discord_key: Some("from-file".to_string()),
            ..Config::default()
        };
        let config = config.with_env_keys(|name| match name {
            "DISCORD_KEY" => Some("from-env".to_string()),
            "BUNGIE_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.discord_key.as_deref(), Some("from-env"));
        assert!(config.bungie_key.is_none());
    }

    #[test]
    fn test_missing_keys() {
        let config = Config {
            bungie_key: Some("  ".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            config.discord_key(),
            Err(ManifestError::MissingKey("DISCORD_KEY"))
        ));
        assert!(matches!(
            config.bungie_key(),
            Err(ManifestError::MissingKey("BUNGIE_KEY"))
        ));
    }

    #[test]
    fn test_example_config_parses_sections() {
        let example = example_config();
        assert!(example.contains("discord_key"));
        assert!(example.contains("bungie_key"));
        assert!(example.contains("[logging]"));
    }

    #[test]
    fn test_config_with_custom_manifest_dir() {
        let custom = PathBuf::from("/tmp/gunsmith-manifests");
        let config = Config::load_with_manifest_dir(custom.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().manifest_dir, custom);
    }
}
