//! # effinova-settings
//!
//! Configuration for the EFFINOVA data-access layer.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`EffinovaSettings::default()`]
//! 2. **User file**: `~/.effinova/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `EFFINOVA_*` overrides (highest priority)
//!
//! Settings are read once at startup and never reloaded.
//!
//! # Usage
//!
//! ```no_run
//! use effinova_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("database: {}", settings.sqlite_path().display());
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_file_layer, load_settings, load_settings_from_path,
    settings_path,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
