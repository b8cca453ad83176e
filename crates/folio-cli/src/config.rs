//! RON configuration file.
//!
//! Looked up at `$XDG_CONFIG_HOME/folio/config.ron` unless `--config` names
//! another file. A missing default file means defaults; a missing explicit
//! file is an error.
//!
//! ```ron
//! (
//!     database: Some("/home/me/notes/folio.db"),
//!     autosave_debounce_ms: 500,
//!     clear_toggle_body_on_retype: false,
//!     log_filter: Some("folio_sync=debug,info"),
//! )
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use folio_editor::{ChildrenPolicy, EditorConfig};
use folio_sync::{AutosaveConfig, DEFAULT_DEBOUNCE, SessionConfig};

/// Error type for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON encode error: {0}")]
    Encode(#[from] ron::Error),
    #[error("no data directory; set `database` in the config")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file. Defaults to `$XDG_DATA_HOME/folio/folio.db`.
    pub database: Option<PathBuf>,
    pub autosave_debounce_ms: u64,
    /// Drop a toggle's body when it is retyped to another kind.
    pub clear_toggle_body_on_retype: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            autosave_debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            clear_toggle_body_on_retype: false,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("folio").join("config.ron"))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// The SQLite file to open.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("folio").join("folio.db"))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn session_config(&self) -> SessionConfig {
        let children_policy = if self.clear_toggle_body_on_retype {
            ChildrenPolicy::Clear
        } else {
            ChildrenPolicy::Retain
        };
        SessionConfig {
            editor: EditorConfig { children_policy },
            autosave: AutosaveConfig {
                debounce: Duration::from_millis(self.autosave_debounce_ms),
            },
        }
    }
}
