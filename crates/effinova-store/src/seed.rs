//! Default reference rows: one employee and one login per role.
//!
//! Inserted with `INSERT OR IGNORE`, so re-seeding never duplicates a
//! badge number or username and never overwrites edits made since.

use chrono::Local;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::database::Handle;
use crate::schema::{HIRE_DATE_COLUMN, Role};
use crate::values;

/// A default employee row.
#[derive(Clone, Copy, Debug)]
pub struct SeedEmployee {
    /// Badge number (`Sicil_No`).
    pub badge: &'static str,
    /// Full name.
    pub full_name: &'static str,
    /// Position.
    pub position: &'static str,
    /// Department.
    pub department: &'static str,
    /// Manager name.
    pub manager: &'static str,
    /// Email address.
    pub email: &'static str,
}

/// A default login.
#[derive(Clone, Copy, Debug)]
pub struct SeedUser {
    /// Username.
    pub username: &'static str,
    /// Plain-text initial password (stored hashed).
    pub password: &'static str,
    /// Role.
    pub role: Role,
    /// Email address.
    pub email: &'static str,
    /// Linked employee badge number.
    pub badge: &'static str,
    /// Department.
    pub department: &'static str,
}

/// Default employees, keyed by badge number.
pub const DEFAULT_EMPLOYEES: [SeedEmployee; 4] = [
    SeedEmployee {
        badge: "GMY001",
        full_name: "İkmal ve Operasyon GMY",
        position: "İkmal ve Operasyon GMY",
        department: "İKMAL ve OPERASYON GMY",
        manager: "GENEL MÜDÜR",
        email: "ikmal.gmy@effinova.com",
    },
    SeedEmployee {
        badge: "MDR001",
        full_name: "Denetim Müdürü",
        position: "Denetim Müdürü",
        department: "DENETİM MÜDÜRLÜĞÜ",
        manager: "GENEL MÜDÜR",
        email: "denetim.mud@effinova.com",
    },
    SeedEmployee {
        badge: "CLS001",
        full_name: "İK Grup Müdürü",
        position: "İK Uzmanı",
        department: "İNSAN KAYNAKLARI GRUP MÜDÜRLÜĞÜ",
        manager: "MALİ VE İDARİ İŞLER GN.MDR.",
        email: "ik.gm@effinova.com",
    },
    SeedEmployee {
        badge: "ADM001",
        full_name: "Satınalma Müdürü",
        position: "Satınalma Müdürü",
        department: "SATIN ALMA MÜDÜRLÜĞÜ",
        manager: "MALİ VE İDARİ İŞLER GN.MDR.",
        email: "satin.mud@effinova.com",
    },
];

/// Default logins, one per role.
pub const DEFAULT_USERS: [SeedUser; 4] = [
    SeedUser {
        username: "admin",
        password: "admin123",
        role: Role::Admin,
        email: "admin@effinova.com",
        badge: "ADM001",
        department: "IT",
    },
    SeedUser {
        username: "mudur",
        password: "mudur123",
        role: Role::Manager,
        email: "mudur@effinova.com",
        badge: "MDR001",
        department: "DENETİM MÜDÜRLÜĞÜ",
    },
    SeedUser {
        username: "calisan",
        password: "calisan123",
        role: Role::Employee,
        email: "calisan@effinova.com",
        badge: "CLS001",
        department: "İNSAN KAYNAKLARI GRUP MÜDÜRLÜĞÜ",
    },
    SeedUser {
        username: "gmy",
        password: "gmy123",
        role: Role::SeniorManager,
        email: "gmy@effinova.com",
        badge: "GMY001",
        department: "İKMAL ve OPERASYON GMY",
    },
];

/// Lowercase hex SHA-256 digest, the stored form of every password.
pub fn hash_password(plain: &str) -> String {
    format!("{:x}", Sha256::digest(plain.as_bytes()))
}

/// Per-table seed outcome.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedCounts {
    /// Employees inserted (existing badge numbers are skipped).
    pub employees: u64,
    /// Users inserted (existing usernames are skipped).
    pub users: u64,
    /// Rows that failed to insert.
    pub failures: u32,
}

const USER_SQL: &str = "INSERT OR IGNORE INTO users \
    (username, password, role, email, employee_sicil_no, department) \
    VALUES (?, ?, ?, ?, ?, ?)";

/// Insert the default employees and users. Each failing row is logged and
/// counted; seeding continues.
pub fn seed_defaults(handle: &mut Handle) -> SeedCounts {
    let mut counts = SeedCounts::default();
    let today = Local::now().date_naive().to_string();
    let employee_sql = format!(
        "INSERT OR IGNORE INTO employees \
         (Ad_Soyad, Pozisyon, Departman, Yonetici_Adi, Email, Sicil_No, {}) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        handle.dialect().quote_ident(HIRE_DATE_COLUMN)
    );

    for e in &DEFAULT_EMPLOYEES {
        let params = values![
            e.full_name,
            e.position,
            e.department,
            e.manager,
            e.email,
            e.badge,
            today.as_str()
        ];
        match handle.execute_update(&employee_sql, &params) {
            Ok(0) => {}
            Ok(_) => {
                info!(badge = e.badge, name = e.full_name, "default employee added");
                counts.employees += 1;
            }
            Err(err) => {
                warn!(badge = e.badge, error = %err, "default employee not added");
                counts.failures += 1;
            }
        }
    }

    for u in &DEFAULT_USERS {
        let params = values![
            u.username,
            hash_password(u.password),
            u.role,
            u.email,
            u.badge,
            u.department
        ];
        match handle.execute_update(USER_SQL, &params) {
            Ok(0) => {}
            Ok(_) => {
                info!(username = u.username, role = %u.role, "default user added");
                counts.users += 1;
            }
            Err(err) => {
                warn!(username = u.username, error = %err, "default user not added");
                counts.failures += 1;
            }
        }
    }

    counts
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_digest_is_sha256_hex() {
        assert_eq!(
            hash_password("admin123"),
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9"
        );
        assert_eq!(hash_password("x").len(), 64);
    }

    #[test]
    fn one_user_per_role() {
        for role in Role::ALL {
            assert_eq!(DEFAULT_USERS.iter().filter(|u| u.role == *role).count(), 1);
        }
    }

    #[test]
    fn every_user_links_a_default_employee() {
        for user in &DEFAULT_USERS {
            assert!(
                DEFAULT_EMPLOYEES.iter().any(|e| e.badge == user.badge),
                "{} links unknown badge {}",
                user.username,
                user.badge
            );
        }
    }
}
