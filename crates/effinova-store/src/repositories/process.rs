//! Processes and their per-employee score submissions.
//!
//! A score's stated total (`toplam_skor`) is stored exactly as submitted;
//! weighting is the scoring panel's business, not this layer's.

use serde::Serialize;

use crate::database::Database;
use crate::errors::Result;
use crate::schema::ApprovalState;
use crate::value::{Row, Value};
use crate::values;

/// Process repository, stateless.
pub struct ProcessRepo;

impl ProcessRepo {
    /// Insert a process and return its id.
    pub fn create(
        db: &Database,
        name: &str,
        department: Option<&str>,
        score: i64,
        weight: f64,
    ) -> Result<i64> {
        db.insert(
            "processes",
            &[
                ("process_name", Value::from(name)),
                ("department", Value::from(department)),
                ("score", Value::from(score)),
                ("weight", Value::from(weight)),
                ("deleted", Value::from(false)),
            ],
        )
    }
}

/// Fields for a new score submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewProcessScore {
    /// Parent process.
    pub process_id: Option<i64>,
    /// Employee name as entered.
    pub employee_name: String,
    /// Employee badge number.
    pub employee_badge: Option<String>,
    /// Output (`cikti`).
    pub output: i64,
    /// Quality (`kalite`).
    pub quality: i64,
    /// Strategy (`strateji`).
    pub strategy: i64,
    /// Innovation (`inovasyon`).
    pub innovation: i64,
    /// Time (`zaman`).
    pub time: f64,
    /// Bonus (`ekstra`).
    pub bonus: i64,
    /// Bonus note (`ekstra_aciklama`).
    pub bonus_note: Option<String>,
    /// Stated total (`toplam_skor`).
    pub total: f64,
    /// Score date (`tarih`, `YYYY-MM-DD`).
    pub date: String,
    /// Approval state.
    pub approval: ApprovalState,
}

/// A stored score submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessScore {
    /// Row id.
    pub id: i64,
    /// Parent process.
    pub process_id: Option<i64>,
    /// Employee name.
    pub employee_name: String,
    /// Employee badge number.
    pub employee_badge: Option<String>,
    /// Output.
    pub output: i64,
    /// Quality.
    pub quality: i64,
    /// Strategy.
    pub strategy: i64,
    /// Innovation.
    pub innovation: i64,
    /// Time.
    pub time: f64,
    /// Bonus.
    pub bonus: i64,
    /// Bonus note.
    pub bonus_note: Option<String>,
    /// Stated total.
    pub total: f64,
    /// Score date.
    pub date: Option<String>,
    /// Approval state.
    pub approval: ApprovalState,
}

/// Process score repository, stateless.
pub struct ProcessScoreRepo;

impl ProcessScoreRepo {
    /// Insert a score submission and return its id.
    pub fn create(db: &Database, new: &NewProcessScore) -> Result<i64> {
        db.insert(
            "process_scores",
            &[
                ("process_id", Value::from(new.process_id)),
                ("employee_name", Value::from(&new.employee_name)),
                ("employee_sicil_no", Value::from(new.employee_badge.clone())),
                ("cikti", Value::from(new.output)),
                ("kalite", Value::from(new.quality)),
                ("strateji", Value::from(new.strategy)),
                ("inovasyon", Value::from(new.innovation)),
                ("zaman", Value::from(new.time)),
                ("ekstra", Value::from(new.bonus)),
                ("ekstra_aciklama", Value::from(new.bonus_note.clone())),
                ("toplam_skor", Value::from(new.total)),
                ("tarih", Value::from(&new.date)),
                ("onay", Value::from(new.approval)),
            ],
        )
    }

    /// Score submission by id.
    pub fn get(db: &Database, id: i64) -> Result<Option<ProcessScore>> {
        db.fetch_optional(
            "SELECT id, process_id, employee_name, employee_sicil_no, cikti, kalite, strateji, \
             inovasyon, zaman, ekstra, ekstra_aciklama, toplam_skor, tarih, onay \
             FROM process_scores WHERE id = ?",
            &values![id],
        )?
        .map(|row| Self::map_row(&row))
        .transpose()
    }

    /// Change the approval state. Returns whether the row exists.
    pub fn set_approval(db: &Database, id: i64, approval: ApprovalState) -> Result<bool> {
        let changed = db.execute_update(
            "UPDATE process_scores SET onay = ? WHERE id = ?",
            &values![approval, id],
        )?;
        Ok(changed > 0)
    }

    fn map_row(row: &Row) -> Result<ProcessScore> {
        let approval = match row.get_string("onay") {
            Some(label) => ApprovalState::from_sql(&label)?,
            None => ApprovalState::default(),
        };
        let int = |column: &str| row.get_i64(column).unwrap_or_default();
        let real = |column: &str| row.get_f64(column).unwrap_or_default();
        Ok(ProcessScore {
            id: int("id"),
            process_id: row.get_i64("process_id"),
            employee_name: row.get_string("employee_name").unwrap_or_default(),
            employee_badge: row.get_string("employee_sicil_no"),
            output: int("cikti"),
            quality: int("kalite"),
            strategy: int("strateji"),
            innovation: int("inovasyon"),
            time: real("zaman"),
            bonus: int("ekstra"),
            bonus_note: row.get_string("ekstra_aciklama"),
            total: real("toplam_skor"),
            date: row.get_string("tarih"),
            approval,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
