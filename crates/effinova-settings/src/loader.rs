//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`EffinovaSettings::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `EFFINOVA_*` environment overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{DatabaseBackend, EffinovaSettings};

/// Resolve the default settings file (`~/.effinova/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".effinova").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<EffinovaSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error. The result is
/// validated before it is returned.
pub fn load_settings_from_path(path: &Path) -> Result<EffinovaSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings.validate()?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<EffinovaSettings> {
    let defaults = serde_json::to_value(EffinovaSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Invalid values are ignored with a warning and the file/default value is
/// kept. `lookup` is the process environment in production and a map in
/// tests.
pub fn apply_env_overrides<F>(settings: &mut EffinovaSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = env.string("EFFINOVA_DB_BACKEND") {
        match DatabaseBackend::parse(&v) {
            Some(backend) => settings.database.backend = backend,
            None => tracing::warn!(key = "EFFINOVA_DB_BACKEND", value = %v, "unknown backend, ignoring"),
        }
    }
    if let Some(v) = env.string("EFFINOVA_SQLITE_PATH") {
        settings.database.sqlite.path = Some(v);
    }
    if let Some(v) = env.string("EFFINOVA_MYSQL_HOST") {
        settings.database.mysql.host = v;
    }
    if let Some(v) = env.u16("EFFINOVA_MYSQL_PORT", 1, 65535) {
        settings.database.mysql.port = v;
    }
    if let Some(v) = env.string("EFFINOVA_MYSQL_DATABASE") {
        settings.database.mysql.database = v;
    }
    if let Some(v) = env.string("EFFINOVA_MYSQL_USER") {
        settings.database.mysql.user = v;
    }
    // An empty password is a legitimate value, so it is not filtered.
    if let Some(v) = (env.lookup)("EFFINOVA_MYSQL_PASSWORD") {
        settings.database.mysql.password = v;
    }

    // ── Paths / logging ─────────────────────────────────────────────
    if let Some(v) = env.string("EFFINOVA_BASE_DIR") {
        settings.paths.base_dir = v;
    }
    if let Some(v) = env.string("EFFINOVA_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("EFFINOVA_LOG_STDERR") {
        settings.logging.stderr = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        let val = (self.lookup)(name)?;
        let result = parse_u16_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
