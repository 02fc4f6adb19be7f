//! Editor settings and their storage.
//!
//! # Responsibility
//! - Define user-tunable editor settings with compiled defaults.
//! - Load and persist settings through the `SettingsStore` seam.
//!
//! # Invariants
//! - Missing settings files and missing keys resolve to defaults.
//! - Settings are written as pretty JSON.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `warn_before_renumber` | `true` | Ask before rewriting child numbers |
//! | `warn_before_reorder` | `true` | Ask before sorting children |

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Editor settings persisted between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    /// Show the confirmation prompt before renumbering.
    pub warn_before_renumber: bool,
    /// Show the confirmation prompt before reordering.
    pub warn_before_reorder: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            warn_before_renumber: true,
            warn_before_reorder: true,
        }
    }
}

/// Errors from settings storage.
#[derive(Debug)]
pub enum SettingsError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "settings file `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid settings file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Settings persistence seam.
pub trait SettingsStore {
    fn load(&self) -> Result<EditorSettings, SettingsError>;
    fn store(&mut self, settings: &EditorSettings) -> Result<(), SettingsError>;
}

/// Settings kept in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    settings: EditorSettings,
}

impl MemorySettings {
    pub fn new(settings: EditorSettings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemorySettings {
    fn load(&self) -> Result<EditorSettings, SettingsError> {
        Ok(self.settings.clone())
    }

    fn store(&mut self, settings: &EditorSettings) -> Result<(), SettingsError> {
        self.settings = settings.clone();
        Ok(())
    }
}

/// Settings stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsFile {
    path: PathBuf,
}

impl JsonSettingsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonSettingsFile {
    fn load(&self) -> Result<EditorSettings, SettingsError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(EditorSettings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn store(&mut self, settings: &EditorSettings) -> Result<(), SettingsError> {
        let io_error = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let raw = serde_json::to_string_pretty(settings).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, raw).map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorSettings, JsonSettingsFile, SettingsError, SettingsStore};

    #[test]
    fn missing_file_and_keys_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = JsonSettingsFile::new(dir.path().join("nested").join("settings.json"));
        assert_eq!(file.load().unwrap(), EditorSettings::default());

        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(file.path(), r#"{"warn_before_reorder": false}"#).unwrap();
        let loaded = file.load().unwrap();
        assert!(loaded.warn_before_renumber);
        assert!(!loaded.warn_before_reorder);

        let updated = EditorSettings {
            warn_before_renumber: false,
            ..loaded
        };
        file.store(&updated).unwrap();
        assert_eq!(file.load().unwrap(), updated);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json").unwrap();
        let err = JsonSettingsFile::new(&path).load().unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
