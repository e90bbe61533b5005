//! Application configuration loaded from a TOML file.
//!
//! Every field is defaulted, so an empty or partial file is valid and the
//! browser works without any file at all.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Top-level application configuration.
///
/// Call [`Config::load`] to read from a TOML path, or
/// [`Config::load_or_default`] to tolerate a missing file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub trash: TrashConfig,
    #[serde(default)]
    pub icons: IconsConfig,
    #[serde(default)]
    pub associations: AssociationsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::from_io(e, &path.display().to_string()))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> CoreResult<Self> {
        match Self::load(path) {
            Err(CoreError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }
}

/// Where `default.toml` is looked up: `./config` if present, else
/// `~/.config/millerfm`.
pub fn config_dir() -> PathBuf {
    let local = PathBuf::from("config");
    if local.exists() {
        return local;
    }
    home_dir().join(".config").join("millerfm")
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Browsing roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory shown as the first column on startup, relative to `root`.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    /// Directory every gateway path resolves against.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            root: default_root(),
        }
    }
}

/// Filesystem change notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recursive: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrashConfig {
    #[serde(default = "default_trash_dir")]
    pub dir: PathBuf,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            dir: default_trash_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconsConfig {
    #[serde(default = "default_resource_dir")]
    pub resource_dir: PathBuf,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            resource_dir: default_resource_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationsConfig {
    #[serde(default = "default_associations_file")]
    pub file: PathBuf,
}

impl Default for AssociationsConfig {
    fn default() -> Self {
        Self {
            file: default_associations_file(),
        }
    }
}

/// Text preview configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
        }
    }
}

/// Pointer input configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,
}

impl InputConfig {
    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            double_click_ms: default_double_click_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_dir() -> String {
    home_dir().to_string_lossy().into_owned()
}

fn default_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_trash_dir() -> PathBuf {
    std::env::var_os("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home_dir().join(".local").join("share"))
        .join("Trash")
}

fn default_resource_dir() -> PathBuf {
    PathBuf::from("resources")
}

fn default_associations_file() -> PathBuf {
    PathBuf::from("resources/settings/file-associations.json")
}

fn default_max_lines() -> usize {
    200
}

fn default_double_click_ms() -> u64 {
    300
}
