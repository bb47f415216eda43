//! Bulk employee import from a spreadsheet.
//!
//! The first worksheet's first row names the columns. Header spellings
//! vary between exports, so every field accepts a few aliases. Each data
//! row upserts one employee and one linked `calisan` login; a bad row is
//! reported and skipped without losing the rows around it.

use std::collections::HashMap;
use std::path::Path;

use calamine::{Reader, Xlsx, open_workbook};
use serde::Serialize;
use tracing::{info, warn};

use crate::database::{Database, Handle};
use crate::errors::{Result, StoreError};
use crate::schema::Role;
use crate::seed::hash_password;
use crate::sqlite;
use crate::values;

const BADGE_HEADERS: &[&str] = &["Sicil_No", "sicil_no", "SICIL_NO"];
const FULL_NAME_HEADERS: &[&str] = &["Ad_Soyad", "ad_soyad", "AD_SOYAD"];
const FIRST_NAME_HEADERS: &[&str] = &["Adı", "Ad", "ADI"];
const LAST_NAME_HEADERS: &[&str] = &["Soyadı", "Soyad", "SOYADI"];
const DEPARTMENT_HEADERS: &[&str] = &["Bölümü", "Departman", "DEPARTMAN"];
const POSITION_HEADERS: &[&str] = &["Pozisyon", "POZISYON"];
const MANAGER_HEADERS: &[&str] = &["Yöneticisi", "Yönetici", "YONETICI"];
const PHONE_HEADERS: &[&str] = &["Telefon", "TELEFON"];
const EMAIL_HEADERS: &[&str] = &["Email", "EMAIL"];

const DEFAULT_DEPARTMENT: &str = "Bilinmiyor";
const DEFAULT_POSITION: &str = "Çalışan";
const EMAIL_DOMAIN: &str = "effinova.com";
const SAVEPOINT: &str = "import_row";

/// One data row of a sheet: header → cell text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// Zero-based position among the data rows (header excluded).
    pub index: usize,
    cells: HashMap<String, String>,
}

impl SheetRow {
    /// Build a row from `(header, cell)` pairs.
    pub fn new<K, V>(index: usize, cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            index,
            cells: cells
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed, non-empty cell under `header`.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .get(header)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// First non-empty cell among `headers`, in order.
    pub fn first_of(&self, headers: &[&str]) -> Option<&str> {
        headers.iter().find_map(|h| self.get(h))
    }
}

/// A row that could not be imported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// One-based data row number.
    pub row: usize,
    /// Why it failed.
    pub message: String,
}

/// Outcome of an import.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows written.
    pub imported: usize,
    /// Rows skipped, in sheet order.
    pub errors: Vec<RowError>,
}

/// An employee record derived from one sheet row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportedEmployee {
    /// Badge number; `auto_<index>` when the sheet has none.
    pub badge: String,
    /// Full name.
    pub full_name: String,
    /// Department.
    pub department: String,
    /// Position.
    pub position: String,
    /// Manager name.
    pub manager: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Email, generated from the name when the sheet has none.
    pub email: String,
}

impl ImportedEmployee {
    /// Username of the linked login.
    pub fn username(&self) -> String {
        format!("user_{}", self.badge)
    }

    /// Initial password of the linked login.
    pub fn initial_password(&self) -> String {
        format!("{}2024!", self.badge)
    }
}

/// Read the first worksheet of an `.xlsx` file. Blank rows are skipped;
/// [`SheetRow::index`] still counts them so row numbers match the sheet.
pub fn read_workbook(path: &Path) -> Result<Vec<SheetRow>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| StoreError::Import(format!("cannot open {}: {e}", path.display())))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| StoreError::Import("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| StoreError::Import(format!("cannot read sheet {sheet}: {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string().trim().to_string()).collect(),
        None => return Err(StoreError::Import(format!("sheet {sheet} is empty"))),
    };

    let data: Vec<SheetRow> = rows
        .enumerate()
        .filter(|(_, cells)| !cells.iter().all(|c| c.to_string().trim().is_empty()))
        .map(|(index, cells)| {
            SheetRow::new(
                index,
                headers
                    .iter()
                    .zip(cells.iter())
                    .filter(|(h, _)| !h.is_empty())
                    .map(|(h, c)| (h.clone(), c.to_string())),
            )
        })
        .collect();

    info!(path = %path.display(), sheet = %sheet, rows = data.len(), "workbook read");
    Ok(data)
}

/// Map a sheet row onto an employee record. Fails only when no name
/// column is filled in.
pub fn parse_row(row: &SheetRow) -> std::result::Result<ImportedEmployee, String> {
    let full_name = match row.first_of(FULL_NAME_HEADERS) {
        Some(name) => name.to_string(),
        None => {
            let parts: Vec<&str> = [
                row.first_of(FIRST_NAME_HEADERS),
                row.first_of(LAST_NAME_HEADERS),
            ]
            .into_iter()
            .flatten()
            .collect();
            if parts.is_empty() {
                return Err("no name column (Ad_Soyad, or Ad and Soyad) is filled in".to_string());
            }
            parts.join(" ")
        }
    };

    let email = row
        .first_of(EMAIL_HEADERS)
        .map_or_else(|| generated_email(&full_name), str::to_string);

    Ok(ImportedEmployee {
        badge: row
            .first_of(BADGE_HEADERS)
            .map_or_else(|| format!("auto_{}", row.index), str::to_string),
        department: row
            .first_of(DEPARTMENT_HEADERS)
            .unwrap_or(DEFAULT_DEPARTMENT)
            .to_string(),
        position: row
            .first_of(POSITION_HEADERS)
            .unwrap_or(DEFAULT_POSITION)
            .to_string(),
        manager: row.first_of(MANAGER_HEADERS).map(str::to_string),
        phone: row.first_of(PHONE_HEADERS).map(str::to_string),
        email,
        full_name,
    })
}

/// `first.last@effinova.com` with Turkish letters folded to ASCII.
pub fn generated_email(full_name: &str) -> String {
    let folded: String = full_name
        .chars()
        .map(|c| match c {
            'ç' | 'Ç' => 'c',
            'ş' | 'Ş' => 's',
            'ğ' | 'Ğ' => 'g',
            'ı' | 'İ' => 'i',
            'ö' | 'Ö' => 'o',
            'ü' | 'Ü' => 'u',
            other => other.to_ascii_lowercase(),
        })
        .collect();
    let local = folded
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(".");
    format!("{local}@{EMAIL_DOMAIN}")
}

/// Import `rows` in one transaction. Each row runs under a savepoint, so a
/// failing row is rolled back alone and the rest are committed together.
pub fn import_employees(db: &Database, rows: &[SheetRow]) -> Result<ImportReport> {
    let report = db.transaction(|tx| {
        let mut report = ImportReport::default();
        for row in rows {
            let number = row.index + 1;
            let outcome = parse_row(row).and_then(|employee| {
                write_row(tx, &employee).map_err(|e| e.to_string())
            });
            match outcome {
                Ok(()) => report.imported += 1,
                Err(message) => {
                    warn!(row = number, error = %message, "import row skipped");
                    report.errors.push(RowError { row: number, message });
                }
            }
        }
        Ok(report)
    })?;

    if let Some(conn) = db.acquire()?.sqlite_connection() {
        if let Err(e) = sqlite::sync_legacy_mirror(conn) {
            warn!(error = %e, "legacy mirror sync after import failed");
        }
    }

    info!(
        imported = report.imported,
        errors = report.errors.len(),
        "employee import finished"
    );
    Ok(report)
}

fn write_row(tx: &mut Handle, employee: &ImportedEmployee) -> Result<()> {
    tx.savepoint(SAVEPOINT)?;
    match upsert(tx, employee) {
        Ok(()) => tx.release_savepoint(SAVEPOINT),
        Err(e) => {
            tx.rollback_to_savepoint(SAVEPOINT)?;
            tx.release_savepoint(SAVEPOINT)?;
            Err(e)
        }
    }
}

fn upsert(tx: &mut Handle, employee: &ImportedEmployee) -> Result<()> {
    let _ = tx.execute_update(
        "INSERT OR REPLACE INTO employees \
         (Sicil_No, Ad_Soyad, Pozisyon, Departman, Yonetici_Adi, Email, Telefon, deleted, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 0, datetime('now'), datetime('now'))",
        &values![
            employee.badge.as_str(),
            employee.full_name.as_str(),
            employee.position.as_str(),
            employee.department.as_str(),
            employee.manager.as_deref(),
            employee.email.as_str(),
            employee.phone.as_deref()
        ],
    )?;
    let _ = tx.execute_update(
        "INSERT OR REPLACE INTO users \
         (username, password, role, email, employee_sicil_no, department, deleted, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0, datetime('now'))",
        &values![
            employee.username(),
            hash_password(&employee.initial_password()),
            Role::Employee,
            employee.email.as_str(),
            employee.badge.as_str(),
            employee.department.as_str()
        ],
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
