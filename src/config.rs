//! User configuration stored in `~/.mytodo/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TodoError};
use crate::locale::Locale;

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DATA_FILE: &str = "tasks.json";

/// Owner used when neither the config file nor the command line names one.
pub const DEFAULT_OWNER: &str = "local";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Owner id stamped on new tasks; listings are scoped to it.
    pub owner: String,
    pub locale: Locale,
    /// Store file. Relative paths resolve against the app directory.
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            owner: DEFAULT_OWNER.to_string(),
            locale: Locale::default(),
            data_file: None,
        }
    }
}

/// `~/.mytodo`, or `./.mytodo` when `HOME` is unset.
pub fn app_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".mytodo")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|source| TodoError::Io { path: path.to_path_buf(), source })?;
        toml::from_str(&content).map_err(|e| TodoError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Config::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| TodoError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| TodoError::Io { path: parent.to_path_buf(), source })?;
        }
        fs::write(path, content).map_err(|source| TodoError::Io { path: path.to_path_buf(), source })
    }

    /// Resolved store file path.
    pub fn data_path(&self, app_dir: &Path) -> PathBuf {
        match &self.data_file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => app_dir.join(file),
            None => app_dir.join(DEFAULT_DATA_FILE),
        }
    }
}
