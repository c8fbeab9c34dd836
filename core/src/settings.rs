//! User settings, read from `settings.yaml` in the config directory.
//!
//! ```yaml
//! storage_dir: /var/lib/stateline
//! log_filter: stateline_core=debug
//! selectors:
//!   owner: cart.owner.name
//!   first_item: cart.items[0]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selector::PathSelector;

pub const CONFIG_DIR_ENV: &str = "STATELINE_CONFIG_DIR";
pub const SETTINGS_FILE: &str = "settings.yaml";


#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}


#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding persisted state documents. Defaults to
    /// `<config_dir>/state`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    /// `tracing` filter directive used when `STATELINE_LOG` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Named selector paths.
    pub selectors: BTreeMap<String, String>,
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Settings::from_yaml(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(yaml)
    }

    pub fn selector(&self, name: &str) -> Option<PathSelector> {
        self.selectors.get(name).map(|path| PathSelector::compile(path))
    }

    /// Every named selector, compiled once.
    pub fn compiled_selectors(&self) -> BTreeMap<String, PathSelector> {
        self.selectors
            .iter()
            .map(|(name, path)| (name.clone(), PathSelector::compile(path)))
            .collect()
    }

    pub fn storage_dir_or(&self, config_dir: &Path) -> PathBuf {
        self.storage_dir
            .clone()
            .unwrap_or_else(|| config_dir.join("state"))
    }
}


// ---------------------------------------------------------------------------
// Config directory
// ---------------------------------------------------------------------------

/// `$STATELINE_CONFIG_DIR`, else `$HOME/.config/stateline`.
pub fn resolve_config_dir() -> PathBuf {
    config_dir_from(
        std::env::var(CONFIG_DIR_ENV).ok(),
        std::env::var("HOME").ok(),
    )
}

/// Default settings file inside the resolved config directory.
pub fn default_settings_path() -> PathBuf {
    resolve_config_dir().join(SETTINGS_FILE)
}

fn config_dir_from(explicit: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(dir) = explicit.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = home.unwrap_or_else(|| "/tmp".into());
    PathBuf::from(home).join(".config").join("stateline")
}
