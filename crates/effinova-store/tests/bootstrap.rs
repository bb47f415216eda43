#![allow(missing_docs, unused_results)]

use effinova_settings::EffinovaSettings;
use effinova_store::sqlite::ConnectionConfig;
use effinova_store::{Database, ENTITY_TABLES, latest_version};

fn file_db(dir: &tempfile::TempDir) -> Database {
    Database::open_sqlite(&dir.path().join("effinova.db"), &ConnectionConfig::default()).unwrap()
}

fn count(db: &Database, table: &str) -> i64 {
    db.fetch_scalar(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .unwrap()
}

#[test]
fn empty_store_gets_entity_tables_and_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir);
    db.initialize().unwrap();

    let tables = db.list_tables().unwrap();
    let entities: Vec<&String> = tables
        .iter()
        .filter(|t| ENTITY_TABLES.contains(&t.as_str()))
        .collect();
    assert_eq!(entities.len(), 8);
    assert!(tables.iter().any(|t| t == "schema_version"));
    assert_eq!(tables.len(), 9, "{tables:?}");

    assert_eq!(count(&db, "employees"), 4);
    assert_eq!(count(&db, "users"), 4);
}

#[test]
fn rerun_leaves_counts_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir);
    db.initialize().unwrap();
    let tables = db.list_tables().unwrap();

    let again = db.initialize().unwrap();
    assert!(again.is_noop(), "{again:?}");
    assert_eq!(db.list_tables().unwrap(), tables);
    assert_eq!(count(&db, "employees"), 4);
    assert_eq!(count(&db, "users"), 4);
}

#[test]
fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    file_db(&dir).initialize().unwrap();

    let reopened = file_db(&dir);
    assert_eq!(reopened.current_version().unwrap(), latest_version());
    let report = reopened.initialize().unwrap();
    assert!(report.migrations_applied.is_empty());
    assert_eq!(count(&reopened, "users"), 4);
}

#[test]
fn seeded_usernames_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir);
    db.initialize().unwrap();
    db.initialize().unwrap();
    let distinct: i64 = db
        .fetch_scalar("SELECT COUNT(DISTINCT username) FROM users", &[])
        .unwrap();
    assert_eq!(distinct, count(&db, "users"));
}

#[test]
fn connect_from_settings_creates_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = EffinovaSettings::default();
    settings.paths.base_dir = dir.path().to_string_lossy().into_owned();
    settings.database.sqlite.path = Some("data/panel.db".into());

    let db = Database::connect(&settings).unwrap();
    db.initialize().unwrap();

    assert!(dir.path().join("data/panel.db").exists());
    for sub in ["uploads", "logs", "exports"] {
        assert!(dir.path().join(sub).is_dir(), "{sub} missing");
    }
    assert!(db.test_connectivity());
}

#[test]
fn wal_is_enabled_for_file_databases() {
    let dir = tempfile::tempdir().unwrap();
    let db = file_db(&dir);
    let handle = db.acquire().unwrap();
    let state =
        effinova_store::sqlite::verify_pragmas(handle.sqlite_connection().unwrap()).unwrap();
    assert!(state.foreign_keys_enabled);
    assert_eq!(state.journal_mode.to_lowercase(), "wal");
}

#[test]
fn legacy_users_table_is_upgraded_and_seeded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("effinova.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'calisan',
                email TEXT,
                deleted INTEGER DEFAULT 0,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
             );
             INSERT INTO users (username, password, role) VALUES ('eski_kullanici', 'x', 'calisan');",
        )
        .unwrap();
    }

    let db = Database::open_sqlite(&path, &ConnectionConfig::default()).unwrap();
    let report = db.initialize().unwrap();
    assert!(report.migration_warnings.is_empty(), "{report:?}");
    assert_eq!(report.users_seeded, 4);
    assert_eq!(count(&db, "users"), 5);

    let linked: i64 = db
        .fetch_scalar(
            "SELECT COUNT(*) FROM users WHERE employee_sicil_no IS NOT NULL",
            &[],
        )
        .unwrap();
    assert_eq!(linked, 4);
}
