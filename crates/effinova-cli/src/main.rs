//! # effinova
//!
//! Operator tool for the EFFINOVA store: bootstrap the schema, check the
//! backend, bulk-import employees, and run ad-hoc read queries.

#![deny(unsafe_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use effinova_settings::EffinovaSettings;
use effinova_store::{Database, import_employees, read_workbook};
use tracing::{error, info};

/// EFFINOVA data store tool.
#[derive(Parser, Debug)]
#[command(name = "effinova", version, about = "EFFINOVA data store tool")]
struct Cli {
    /// Settings file (defaults to `~/.effinova/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// `SQLite` database file, overriding the settings.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Create or migrate the schema and insert the default rows.
    Init,
    /// Check that the database answers.
    Check,
    /// Import employees and their logins from an `.xlsx` file.
    Import {
        /// Spreadsheet to read.
        file: PathBuf,
        /// User recorded in the audit log.
        #[arg(long, default_value = "admin")]
        actor: String,
    },
    /// Run a read-only statement and print each row as a JSON line.
    Query {
        /// SQL text.
        sql: String,
    },
}

fn load_settings(cli: &Cli) -> Result<EffinovaSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(effinova_settings::settings_path);
    let mut settings = effinova_settings::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if let Some(db_path) = &cli.db_path {
        settings.database.sqlite.path = Some(db_path.to_string_lossy().into_owned());
    }
    Ok(settings)
}

fn init_logging(settings: &EffinovaSettings) {
    let path = settings.log_file_path();
    if let Err(e) = effinova_logging::init_file_subscriber(
        &settings.logging.level,
        &path,
        settings.logging.stderr,
    ) {
        effinova_logging::init_subscriber(&settings.logging.level);
        error!(path = %path.display(), error = %e, "log file unavailable, logging to stderr");
    }
}

/// Statements `query` accepts.
fn is_read_only(sql: &str) -> bool {
    let first = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    ["SELECT", "WITH", "PRAGMA", "EXPLAIN", "SHOW", "DESCRIBE"]
        .iter()
        .any(|kw| first.eq_ignore_ascii_case(kw))
}

fn run_init(db: &Database) -> Result<ExitCode> {
    let report = db.initialize().context("Database initialization failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn run_check(db: &Database) -> ExitCode {
    if db.test_connectivity() {
        println!("ok ({})", db.dialect().name());
        ExitCode::SUCCESS
    } else {
        println!("unreachable ({})", db.dialect().name());
        ExitCode::FAILURE
    }
}

fn run_import(db: &Database, file: &Path, actor: &str) -> Result<ExitCode> {
    let _ = db.initialize().context("Database initialization failed")?;
    let rows = read_workbook(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let report = import_employees(db, &rows).context("Import failed")?;

    let details = format!(
        "{}: {} imported, {} errors",
        file.display(),
        report.imported,
        report.errors.len()
    );
    db.log_action(actor, "excel_import", Some(&details), Some("employees"), None);

    println!("imported: {}", report.imported);
    for err in &report.errors {
        println!("row {}: {}", err.row, err.message);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_query(db: &Database, sql: &str) -> Result<ExitCode> {
    if !is_read_only(sql) {
        bail!("query only runs read-only statements");
    }
    let rows = db.fetch_all(sql, &[]).context("Query failed")?;
    let mut out = std::io::stdout().lock();
    for row in &rows {
        writeln!(out, "{}", serde_json::to_string(row)?)?;
    }
    info!(rows = rows.len(), "query finished");
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_logging(&settings);

    let db = Database::connect(&settings).context("Failed to open database")?;
    info!(command = ?cli.command, dialect = db.dialect().name(), "effinova starting");

    match &cli.command {
        Command::Init => run_init(&db),
        Command::Check => Ok(run_check(&db)),
        Command::Import { file, actor } => run_import(&db, file, actor),
        Command::Query { sql } => run_query(&db, sql),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
