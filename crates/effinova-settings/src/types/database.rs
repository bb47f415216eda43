//! Database backend selection and per-backend connection parameters.

use serde::{Deserialize, Serialize};

/// Which relational backend the data-access layer talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Embedded single-file store.
    #[default]
    Sqlite,
    /// External `MySQL` server.
    Mysql,
}

impl DatabaseBackend {
    /// Parse a backend name (case-insensitive). Accepts `mariadb` as `mysql`.
    pub fn parse(val: &str) -> Option<Self> {
        match val.trim().to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mysql" | "mariadb" => Some(Self::Mysql),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Mysql => write!(f, "mysql"),
        }
    }
}

/// Database settings: backend selector plus both backends' parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Active backend.
    pub backend: DatabaseBackend,
    /// Embedded-file store parameters.
    pub sqlite: SqliteSettings,
    /// External server parameters.
    pub mysql: MySqlSettings,
}

/// `SQLite` file and pool parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SqliteSettings {
    /// Database file. Relative paths resolve against `paths.baseDir`;
    /// unset means `<baseDir>/effinova.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u32,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self {
            path: None,
            pool_size: 8,
            busy_timeout_ms: 5_000,
        }
    }
}

/// `MySQL` connection parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MySqlSettings {
    /// Server host name or IP.
    pub host: String,
    /// Schema name.
    pub database: String,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// TCP port.
    pub port: u16,
    /// Connection character set.
    pub charset: String,
    /// Connection collation.
    pub collation: String,
    /// Whether the session runs in autocommit mode.
    pub autocommit: bool,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            database: "effinova_db".to_string(),
            user: "root".to_string(),
            password: String::new(),
            port: 3306,
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
            autocommit: true,
            pool_size: 8,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_defaults_to_sqlite() {
        assert_eq!(DatabaseBackend::default(), DatabaseBackend::Sqlite);
    }

    #[test]
    fn backend_parse_variants() {
        assert_eq!(DatabaseBackend::parse("SQLite"), Some(DatabaseBackend::Sqlite));
        assert_eq!(DatabaseBackend::parse(" mysql "), Some(DatabaseBackend::Mysql));
        assert_eq!(DatabaseBackend::parse("mariadb"), Some(DatabaseBackend::Mysql));
        assert_eq!(DatabaseBackend::parse("postgres"), None);
    }

    #[test]
    fn backend_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&DatabaseBackend::Mysql).unwrap(),
            "\"mysql\""
        );
        let back: DatabaseBackend = serde_json::from_str("\"sqlite\"").unwrap();
        assert_eq!(back, DatabaseBackend::Sqlite);
    }

    #[test]
    fn mysql_defaults_match_legacy_deployment() {
        let mysql = MySqlSettings::default();
        assert_eq!(mysql.host, "localhost");
        assert_eq!(mysql.database, "effinova_db");
        assert_eq!(mysql.port, 3306);
        assert_eq!(mysql.charset, "utf8mb4");
        assert_eq!(mysql.collation, "utf8mb4_unicode_ci");
        assert!(mysql.autocommit);
    }

    #[test]
    fn sqlite_partial_json_keeps_defaults() {
        let s: SqliteSettings = serde_json::from_str(r#"{"poolSize": 2}"#).unwrap();
        assert_eq!(s.pool_size, 2);
        assert_eq!(s.busy_timeout_ms, 5_000);
        assert!(s.path.is_none());
    }
}
