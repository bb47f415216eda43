//! Employee repository over the `employees` table.
//!
//! Rows are keyed by badge number (`Sicil_No`, unique). Deletion is soft:
//! `deleted = 1` hides a row from every read here, and a `NULL` flag left
//! by older writers counts as active.

use serde::Serialize;

use crate::database::Database;
use crate::dialect::Dialect;
use crate::errors::Result;
use crate::schema::{ACTIVE_PREDICATE, HIRE_DATE_COLUMN};
use crate::value::{Row, Value};
use crate::values;

/// A stored employee.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Employee {
    /// Row id.
    pub id: i64,
    /// Full name (`Ad_Soyad`).
    pub full_name: String,
    /// Position (`Pozisyon`).
    pub position: String,
    /// Department (`Departman`).
    pub department: String,
    /// Manager name (`Yonetici_Adi`).
    pub manager: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Badge number (`Sicil_No`).
    pub badge: String,
    /// Hire date.
    pub hire_date: Option<String>,
    /// Phone (`Telefon`).
    pub phone: Option<String>,
    /// Address (`Adres`).
    pub address: Option<String>,
    /// Birth date (`Dogum_Tarihi`).
    pub birth_date: Option<String>,
    /// Education (`Egitim`).
    pub education: Option<String>,
    /// Certificates (`Sertifikalar`).
    pub certificates: Option<String>,
    /// Skills (`Yetenekler`).
    pub skills: Option<String>,
    /// Soft-delete flag; `NULL` reads as `false`.
    pub deleted: bool,
    /// Creation time as stored.
    pub created_at: Option<String>,
}

/// Fields for a new employee. Unset optional fields are stored as `NULL`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewEmployee {
    /// Full name.
    pub full_name: String,
    /// Position.
    pub position: String,
    /// Department.
    pub department: String,
    /// Badge number; must be unique.
    pub badge: String,
    /// Manager name.
    pub manager: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Hire date (`YYYY-MM-DD`).
    pub hire_date: Option<String>,
    /// Phone.
    pub phone: Option<String>,
    /// Address.
    pub address: Option<String>,
    /// Birth date.
    pub birth_date: Option<String>,
    /// Education.
    pub education: Option<String>,
    /// Certificates.
    pub certificates: Option<String>,
    /// Skills.
    pub skills: Option<String>,
}

/// Employee repository, stateless.
pub struct EmployeeRepo;

impl EmployeeRepo {
    /// Insert an employee and return its id. A duplicate badge number
    /// fails with [`StoreError::Statement`](crate::StoreError::Statement)
    /// and leaves the existing row untouched.
    pub fn create(db: &Database, new: &NewEmployee) -> Result<i64> {
        db.insert(
            "employees",
            &[
                ("Ad_Soyad", Value::from(&new.full_name)),
                ("Pozisyon", Value::from(&new.position)),
                ("Departman", Value::from(&new.department)),
                ("Yonetici_Adi", Value::from(new.manager.clone())),
                ("Email", Value::from(new.email.clone())),
                ("Sicil_No", Value::from(&new.badge)),
                (HIRE_DATE_COLUMN, Value::from(new.hire_date.clone())),
                ("Telefon", Value::from(new.phone.clone())),
                ("Adres", Value::from(new.address.clone())),
                ("Dogum_Tarihi", Value::from(new.birth_date.clone())),
                ("Egitim", Value::from(new.education.clone())),
                ("Sertifikalar", Value::from(new.certificates.clone())),
                ("Yetenekler", Value::from(new.skills.clone())),
                ("deleted", Value::from(false)),
            ],
        )
    }

    /// Active employee with `badge`, if any.
    pub fn find_by_badge(db: &Database, badge: &str) -> Result<Option<Employee>> {
        let sql = select_sql(db.dialect(), "Sicil_No = ? AND");
        Ok(db
            .fetch_optional(&sql, &values![badge])?
            .map(|row| Self::map_row(&row)))
    }

    /// Every active employee, ordered by name.
    pub fn list_active(db: &Database) -> Result<Vec<Employee>> {
        let sql = format!("{} ORDER BY Ad_Soyad", select_sql(db.dialect(), ""));
        Ok(db
            .fetch_all(&sql, &[])?
            .iter()
            .map(Self::map_row)
            .collect())
    }

    /// Soft-delete by badge number. Returns whether an active row changed.
    pub fn soft_delete(db: &Database, badge: &str) -> Result<bool> {
        let changed = db.execute_update(
            &format!("UPDATE employees SET deleted = ? WHERE Sicil_No = ? AND {ACTIVE_PREDICATE}"),
            &values![true, badge],
        )?;
        Ok(changed > 0)
    }

    /// Number of active employees.
    pub fn count_active(db: &Database) -> Result<i64> {
        db.fetch_scalar(
            &format!("SELECT COUNT(*) FROM employees WHERE {ACTIVE_PREDICATE}"),
            &[],
        )
    }

    fn map_row(row: &Row) -> Employee {
        Employee {
            id: row.get_i64("id").unwrap_or_default(),
            full_name: row.get_string("Ad_Soyad").unwrap_or_default(),
            position: row.get_string("Pozisyon").unwrap_or_default(),
            department: row.get_string("Departman").unwrap_or_default(),
            manager: row.get_string("Yonetici_Adi"),
            email: row.get_string("Email"),
            badge: row.get_string("Sicil_No").unwrap_or_default(),
            hire_date: row.get_string(HIRE_DATE_COLUMN),
            phone: row.get_string("Telefon"),
            address: row.get_string("Adres"),
            birth_date: row.get_string("Dogum_Tarihi"),
            education: row.get_string("Egitim"),
            certificates: row.get_string("Sertifikalar"),
            skills: row.get_string("Yetenekler"),
            deleted: row.get("deleted").and_then(Value::as_bool).unwrap_or(false),
            created_at: row.get_string("created_at"),
        }
    }
}

fn select_sql(dialect: Dialect, filter: &str) -> String {
    format!(
        "SELECT id, Ad_Soyad, Pozisyon, Departman, Yonetici_Adi, Email, Sicil_No, {hire}, \
         Telefon, Adres, Dogum_Tarihi, Egitim, Sertifikalar, Yetenekler, deleted, created_at \
         FROM employees WHERE {filter} {ACTIVE_PREDICATE}",
        hire = dialect.quote_ident(HIRE_DATE_COLUMN),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
