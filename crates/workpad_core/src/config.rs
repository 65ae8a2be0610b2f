//! Configuration types for Workpad.
//!
//! This module provides the [`Config`] struct which stores client settings
//! and the persisted session. Configuration is persisted as TOML (typically
//! at `~/.config/workpad/config.toml` on Unix systems).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WorkpadError};
use crate::fs::FileSystem;

/// Which datastore backend the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SQLite database under the data directory (feature `sqlite`)
    #[default]
    Sqlite,
    /// JSON documents under the data directory (`workspaces-<userId>.json`)
    Local,
}

/// `Config` is a data structure that represents the parts of Workpad that the user can configure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Origin used when constructing share links
    /// (links look like `<origin>/share/page/<pageId>`)
    pub share_origin: String,

    /// Directory holding the datastore files
    pub data_dir: PathBuf,

    /// Datastore backend selection
    #[serde(default)]
    pub backend: Backend,

    // ========================================================================
    // Persisted session
    // ========================================================================
    /// User id of the persisted session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_user_id: Option<String>,

    /// Email address of the persisted session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_email: Option<String>,
}

const DEFAULT_ORIGIN: &str = "https://app.workpad.dev";

impl Config {
    /// Create a new config with the given data directory.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            share_origin: DEFAULT_ORIGIN.to_string(),
            data_dir,
            backend: Backend::default(),
            session_user_id: None,
            session_email: None,
        }
    }

    /// The persisted session as a user, if both fields are present.
    pub fn session_user(&self) -> Option<crate::model::User> {
        match (&self.session_user_id, &self.session_email) {
            (Some(id), Some(email)) => Some(crate::model::User {
                id: id.clone(),
                email: email.clone(),
            }),
            _ => None,
        }
    }

    /// Record a session for later restoration.
    pub fn set_session(&mut self, user: &crate::model::User) {
        self.session_user_id = Some(user.id.clone());
        self.session_email = Some(user.email.clone());
    }

    /// Forget the persisted session.
    pub fn clear_session(&mut self) {
        self.session_user_id = None;
        self.session_email = None;
    }

    // ========================================================================
    // FileSystem-based methods (work on all platforms including WASM)
    // ========================================================================

    /// Load config from a specific path using a FileSystem.
    pub fn load_from<FS: FileSystem>(fs: &FS, path: &Path) -> Result<Self> {
        let contents = fs
            .read_to_string(path)
            .map_err(|e| WorkpadError::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path using a FileSystem.
    pub fn save_to<FS: FileSystem>(&self, fs: &FS, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs.create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs.write_file(path, &contents)
            .map_err(|e| WorkpadError::FileWrite {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(())
    }

    /// Load config from a FileSystem, returning a default if not found.
    pub fn load_from_or_default<FS: FileSystem>(fs: &FS, path: &Path, data_dir: PathBuf) -> Self {
        match Self::load_from(fs, path) {
            Ok(config) => config,
            Err(_) => Self::new(data_dir),
        }
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("workpad");
        Self::new(data_dir)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/workpad/config.toml)
    /// Only available on native platforms
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("workpad").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    /// Only available on native platforms
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let contents = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }

        // Return default config if file doesn't exist
        Ok(Config::default())
    }

    /// Save config to default location
    /// Only available on native platforms
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(WorkpadError::NoConfigDir)?;

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        Ok(())
    }
}
