//! # effinova-logging
//!
//! Structured logging with `tracing`.
//!
//! Two sinks are supported:
//! - **stderr**: compact human-readable output ([`init_subscriber`]).
//! - **log file**: timestamped, non-ANSI lines appended to a file, optionally
//!   teed to stderr ([`init_file_subscriber`]).
//!
//! `RUST_LOG` always wins over the configured level.

#![deny(unsafe_code)]

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Build the level filter: `RUST_LOG` if set and valid, else `level`.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Open `path` for appending, creating the parent directory first.
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global subscriber with stderr output only.
///
/// Call once at startup. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(true)
        .with_writer(io::stderr)
        .compact();

    // try_init fails if a global subscriber is already set
    let _ = subscriber.try_init();
}

/// Build a subscriber that appends timestamped lines to `path`.
///
/// When `also_stderr` is set, events are additionally written to stderr in
/// compact form.
pub fn file_subscriber(
    level: &str,
    path: &Path,
    also_stderr: bool,
) -> io::Result<impl Subscriber + Send + Sync + 'static> {
    let file = open_log_file(path)?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file));

    let stderr_layer = also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(io::stderr)
            .compact()
    });

    Ok(tracing_subscriber::registry()
        .with(env_filter(level))
        .with(file_layer)
        .with(stderr_layer))
}

/// Initialize the global subscriber with the log file sink.
///
/// Returns `Ok(false)` when a global subscriber was already installed.
pub fn init_file_subscriber(level: &str, path: &Path, also_stderr: bool) -> io::Result<bool> {
    let subscriber = file_subscriber(level, path, also_stderr)?;
    Ok(tracing::subscriber::set_global_default(subscriber).is_ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
