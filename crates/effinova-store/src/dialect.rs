//! SQL dialect rewriting.
//!
//! Call sites write `SQLite` SQL with positional `?` placeholders. For the
//! `MySQL` backend the handful of constructs that differ are rewritten
//! here, so no other module branches on the backend.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Target SQL dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// `SQLite` (statements pass through unchanged).
    Sqlite,
    /// `MySQL` / `MariaDB`.
    MySql,
}

/// Replacement for each rewrite group of [`REWRITE`], in group order
/// starting at group 2.
const REPLACEMENTS: [&str; 4] = ["INSERT IGNORE", "REPLACE", "NOW()", "CURDATE()"];

/// Group 1 matches a quoted literal or identifier, which is copied through
/// untouched. Every other group is one construct to rewrite.
static REWRITE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)('(?:[^']|'')*'|"(?:[^"]|"")*"|`(?:[^`]|``)*`)"#,
        r"|\b(INSERT\s+OR\s+IGNORE)\b",
        r"|\b(INSERT\s+OR\s+REPLACE)\b",
        r"|\b(datetime\(\s*'now'\s*\))",
        r"|\b(date\(\s*'now'\s*\))",
    ))
    .ok()
});

impl Dialect {
    /// Rewrite `sql` for this dialect. Borrows when nothing changes.
    /// Text inside quotes is never rewritten.
    pub fn render<'a>(self, sql: &'a str) -> Cow<'a, str> {
        let (Self::MySql, Some(re)) = (self, REWRITE.as_ref()) else {
            return Cow::Borrowed(sql);
        };
        let out = re.replace_all(sql, |caps: &Captures<'_>| {
            REPLACEMENTS
                .iter()
                .enumerate()
                .find_map(|(i, replacement)| caps.get(i + 2).map(|_| (*replacement).to_string()))
                .unwrap_or_else(|| caps[0].to_string())
        });
        if out == sql {
            Cow::Borrowed(sql)
        } else {
            Cow::Owned(out.into_owned())
        }
    }

    /// Quote an identifier (needed for `İşe_Giriş_Tarihi` and reserved words).
    pub fn quote_ident(self, ident: &str) -> String {
        match self {
            Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Statement that opens a transaction.
    pub fn begin_sql(self) -> &'static str {
        match self {
            Self::Sqlite => "BEGIN",
            Self::MySql => "START TRANSACTION",
        }
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
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
    fn sqlite_passes_through() {
        let sql = "INSERT OR IGNORE INTO users (username) VALUES (?)";
        assert!(matches!(Dialect::Sqlite.render(sql), Cow::Borrowed(s) if s == sql));
    }

    #[test]
    fn mysql_rewrites_upsert_verbs() {
        assert_eq!(
            Dialect::MySql.render("INSERT OR IGNORE INTO users (username) VALUES (?)"),
            "INSERT IGNORE INTO users (username) VALUES (?)"
        );
        assert_eq!(
            Dialect::MySql.render("insert or replace into employees (Sicil_No) VALUES (?)"),
            "REPLACE into employees (Sicil_No) VALUES (?)"
        );
    }

    #[test]
    fn mysql_rewrites_time_helpers() {
        assert_eq!(
            Dialect::MySql.render("UPDATE users SET last_login = datetime('now') WHERE id = ?"),
            "UPDATE users SET last_login = NOW() WHERE id = ?"
        );
        assert_eq!(
            Dialect::MySql.render("SELECT * FROM badges WHERE awarded_date = date('now')"),
            "SELECT * FROM badges WHERE awarded_date = CURDATE()"
        );
    }

    #[test]
    fn mysql_leaves_plain_sql_borrowed() {
        let sql = "SELECT id FROM employees WHERE Sicil_No = ?";
        assert!(matches!(Dialect::MySql.render(sql), Cow::Borrowed(_)));
    }

    #[test]
    fn quoting_per_dialect() {
        assert_eq!(Dialect::Sqlite.quote_ident("İşe_Giriş_Tarihi"), "\"İşe_Giriş_Tarihi\"");
        assert_eq!(Dialect::MySql.quote_ident("timestamp"), "`timestamp`");
        assert_eq!(Dialect::Sqlite.quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn identifiers_containing_keywords_are_untouched() {
        let sql = "SELECT updated_date('now') FROM t";
        assert_eq!(Dialect::MySql.render(sql), sql);
    }

    #[test]
    fn quoted_text_is_not_rewritten() {
        let sql = "INSERT INTO audit_log (action, details) VALUES ('note', 'INSERT OR IGNORE at date(''now'')')";
        assert!(matches!(Dialect::MySql.render(sql), Cow::Borrowed(s) if s == sql));

        assert_eq!(
            Dialect::MySql.render(
                "INSERT OR IGNORE INTO audit_log (details, timestamp) VALUES ('datetime(''now'')', datetime('now'))"
            ),
            "INSERT IGNORE INTO audit_log (details, timestamp) VALUES ('datetime(''now'')', NOW())"
        );
        assert_eq!(
            Dialect::MySql.render(r#"SELECT "date('now')" FROM t WHERE d = date('now')"#),
            r#"SELECT "date('now')" FROM t WHERE d = CURDATE()"#
        );
        let quoted = "SELECT `insert or ignore` FROM t";
        assert_eq!(Dialect::MySql.render(quoted), quoted);
    }
}
