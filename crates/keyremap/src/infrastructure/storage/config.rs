//! TOML-based configuration persistence.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\KeyRemapper\config.toml`
//! - Linux:    `~/.config/keyremapper/config.toml`
//! - macOS:    `~/Library/Application Support/KeyRemapper/config.toml`
//!
//! ```toml
//! [remap]
//! toggle_hotkey = 40
//! start_enabled = true
//!
//! [storage]
//! mappings_file = "mappings.json"
//!
//! [logging]
//! log_level = "info"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section, or
//! a file from an older version all load cleanly.

use std::path::{Path, PathBuf};

use keyremap_core::{EngineState, KeyCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the mapping table when `storage.mappings_file` is unset.
pub const DEFAULT_MAPPINGS_FILE: &str = "mappings.json";

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

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub remap: RemapConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Startup state of the remap engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemapConfig {
    /// Virtual-key code of the toggle hotkey.  Defaults to Down Arrow (40).
    #[serde(default = "default_toggle_hotkey")]
    pub toggle_hotkey: u16,
    /// Whether remapping is active at startup.
    #[serde(default = "default_true")]
    pub start_enabled: bool,
}

/// Location of the mapping table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Relative paths resolve against the config directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mappings_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_toggle_hotkey() -> u16 {
    KeyCode::DOWN.value()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            toggle_hotkey: default_toggle_hotkey(),
            start_enabled: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Engine state the session starts with.
    pub fn engine_state(&self) -> EngineState {
        EngineState {
            enabled: self.remap.start_enabled,
            toggle_hotkey: KeyCode(self.remap.toggle_hotkey),
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

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
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

/// Configuration the process starts with, plus where changes may go.
#[derive(Debug)]
pub struct StartupConfig {
    pub config: AppConfig,
    /// File runtime changes (the captured toggle hotkey) are written to.
    /// `None` when the existing file could not be read or parsed, so the
    /// user's file is never replaced by defaults.
    pub save_path: Option<PathBuf>,
    /// Directory relative mapping paths resolve against.
    pub base_dir: PathBuf,
    /// Why defaults were used, if they were.
    pub problem: Option<ConfigError>,
}

/// Loads the startup configuration from `path`, falling back to defaults.
///
/// A missing file is normal on first run and stays writable.  A file that
/// exists but cannot be read or parsed yields defaults with no `save_path`.
pub fn load_startup_config(path: Result<PathBuf, ConfigError>) -> StartupConfig {
    let path = match path {
        Ok(path) => path,
        Err(problem) => {
            return StartupConfig {
                config: AppConfig::default(),
                save_path: None,
                base_dir: PathBuf::from("."),
                problem: Some(problem),
            }
        }
    };

    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    match load_config_from(&path) {
        Ok(config) => StartupConfig {
            config,
            save_path: Some(path),
            base_dir,
            problem: None,
        },
        Err(problem) => StartupConfig {
            config: AppConfig::default(),
            save_path: None,
            base_dir,
            problem: Some(problem),
        },
    }
}

/// Resolves where the mapping table lives.
///
/// Absolute `storage.mappings_file` values are used as-is; relative ones and
/// the default file name are joined onto `base_dir`.
pub fn mappings_file_path(config: &AppConfig, base_dir: &Path) -> PathBuf {
    match &config.storage.mappings_file {
        Some(p) if p.is_absolute() => p.clone(),
        Some(p) => base_dir.join(p),
        None => base_dir.join(DEFAULT_MAPPINGS_FILE),
    }
}

/// Resolves the platform config base directory including the `KeyRemapper` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeyRemapper"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keyremapper"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeyRemapper")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
