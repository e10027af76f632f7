//! TOML-based configuration persistence for the client.
//!
//! Reads and writes [`ClientConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\Padlink\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/padlink/config.toml` or `~/.config/padlink/config.toml`
//! - macOS:    `~/Library/Application Support/Padlink/config.toml`
//!
//! ```toml
//! [connection]
//! endpoint = "ws://192.168.1.20:8080/api/socket"
//! max_retries = 5
//!
//! [input]
//! mode = "touch"
//! width = 1920
//! height = 1080
//! device_pixel_ratio = 2.0
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every field has a serde default, so a partial file (or none at all) is
//! valid.

use std::path::{Path, PathBuf};

use padlink_core::Viewport;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::input_capture::InputMode;
use crate::infrastructure::network::connection_manager::{
    ConnectionConfig, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES,
};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    #[serde(default)]
    pub connection: ConnectionSection,
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Where to connect and how hard to try.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionSection {
    /// WebSocket URL of the trackpad server.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Reconnects tolerated over the lifetime of the process.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Capture surface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputSection {
    /// `"pointer"` or `"touch"`.
    #[serde(default)]
    pub mode: InputMode,
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_device_pixel_ratio")]
    pub device_pixel_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_width() -> i32 {
    1920
}
fn default_height() -> i32 {
    1080
}
fn default_device_pixel_ratio() -> f64 {
    1.0
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            mode: InputMode::default(),
            width: default_width(),
            height: default_height(),
            device_pixel_ratio: default_device_pixel_ratio(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ClientConfig {
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            endpoint: self.connection.endpoint.clone(),
            max_retries: self.connection.max_retries,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.input.width,
            height: self.input.height,
            device_pixel_ratio: self.input.device_pixel_ratio,
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `ClientConfig` from `path`, returning `ClientConfig::default()` if
/// the file does not exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &ClientConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory, including the `Padlink` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("Padlink"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("padlink"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("Padlink"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default_values() {
        // Arrange / Act
        let cfg = ClientConfig::default();

        // Assert
        assert_eq!(cfg.connection.endpoint, "ws://127.0.0.1:8080/api/socket");
        assert_eq!(cfg.connection.max_retries, 5);
        assert_eq!(cfg.input.mode, InputMode::Pointer);
        assert_eq!(cfg.viewport(), Viewport::default());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        // Arrange
        let toml_str = r#"
            [connection]
            max_retries = 2

            [input]
            mode = "touch"
        "#;

        // Act
        let cfg: ClientConfig = toml::from_str(toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg.connection.max_retries, 2);
        assert_eq!(cfg.connection.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.input.mode, InputMode::Touch);
        assert_eq!(cfg.input.width, 1920);
        assert_eq!(cfg.logging, LoggingSection::default());
    }

    #[test]
    fn test_empty_toml_is_default_config() {
        let cfg: ClientConfig = toml::from_str("").expect("deserialize");
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_unknown_input_mode_fails_to_parse() {
        let result: Result<ClientConfig, _> = toml::from_str("[input]\nmode = \"stylus\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, ClientConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_config() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = ClientConfig::default();
        cfg.connection.endpoint = "ws://10.0.0.5:9000/api/socket".to_string();
        cfg.input.mode = InputMode::Touch;
        cfg.input.device_pixel_ratio = 3.0;

        // Act
        save_config_to(&path, &cfg).unwrap();
        let restored = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(restored, cfg);
        assert_eq!(restored.viewport().resolution(), 11);
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[connection\nendpoint = ").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_connection_config_mirrors_section() {
        let mut cfg = ClientConfig::default();
        cfg.connection.max_retries = 9;
        let conn = cfg.connection_config();
        assert_eq!(conn.max_retries, 9);
        assert_eq!(conn.endpoint, cfg.connection.endpoint);
    }
}
