//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with production values, so partial JSON files are valid.

mod database;

pub use database::*;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Default `SQLite` file name under the base directory.
pub const DEFAULT_SQLITE_FILENAME: &str = "effinova.db";

/// Root settings type.
///
/// Loaded once at startup and passed by reference to whatever needs it;
/// there is no process-wide instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffinovaSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Database backend and connection parameters.
    pub database: DatabaseSettings,
    /// Working directory layout.
    pub paths: PathSettings,
    /// Log sink configuration.
    pub logging: LoggingSettings,
}

impl Default for EffinovaSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "effinova".to_string(),
            database: DatabaseSettings::default(),
            paths: PathSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl EffinovaSettings {
    /// Absolute-or-relative path of the `SQLite` database file.
    pub fn sqlite_path(&self) -> PathBuf {
        match self.database.sqlite.path.as_deref() {
            Some(p) => self.paths.resolve(p),
            None => self.paths.base_dir().join(DEFAULT_SQLITE_FILENAME),
        }
    }

    /// Path of the log file sink.
    pub fn log_file_path(&self) -> PathBuf {
        self.paths.resolve(&self.logging.file)
    }

    /// Working directories to create on first use.
    pub fn working_dirs(&self) -> Vec<PathBuf> {
        self.paths
            .working_dirs
            .iter()
            .map(|d| self.paths.resolve(d))
            .collect()
    }

    /// Reject values that would only fail later at connect time.
    pub fn validate(&self) -> Result<()> {
        if self.database.sqlite.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "database.sqlite.poolSize must be at least 1".into(),
            ));
        }
        if self.database.backend == DatabaseBackend::Mysql {
            if self.database.mysql.host.trim().is_empty() {
                return Err(SettingsError::InvalidValue(
                    "database.mysql.host must not be empty".into(),
                ));
            }
            if self.database.mysql.pool_size == 0 {
                return Err(SettingsError::InvalidValue(
                    "database.mysql.poolSize must be at least 1".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Working directory layout.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathSettings {
    /// Directory relative paths resolve against.
    pub base_dir: String,
    /// Directories created lazily on first database use.
    pub working_dirs: Vec<String>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            base_dir: ".".to_string(),
            working_dirs: vec![
                "uploads".to_string(),
                "logs".to_string(),
                "exports".to_string(),
            ],
        }
    }
}

impl PathSettings {
    /// The base directory as a path.
    pub fn base_dir(&self) -> &Path {
        Path::new(&self.base_dir)
    }

    /// Resolve `path` against the base directory unless it is absolute.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.base_dir().join(p)
        }
    }
}

/// Log sink configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`trace`..`error`). `RUST_LOG` takes precedence.
    pub level: String,
    /// Log file, relative to the base directory.
    pub file: String,
    /// Also write to stderr.
    pub stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "logs/config.log".to_string(),
            stderr: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
