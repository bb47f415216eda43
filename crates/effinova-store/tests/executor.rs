#![allow(missing_docs, unused_results)]

use assert_matches::assert_matches;
use effinova_store::sqlite::ConnectionConfig;
use effinova_store::{
    ApprovalState, Database, EmployeeRepo, NewEmployee, NewProcessScore, ProcessRepo,
    ProcessScoreRepo, QueryOutput, StoreError, Value, values,
};
use proptest::prelude::*;

fn setup() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db =
        Database::open_sqlite(&dir.path().join("effinova.db"), &ConnectionConfig::default()).unwrap();
    db.initialize().unwrap();
    (dir, db)
}

fn employee(badge: &str, name: &str) -> NewEmployee {
    NewEmployee {
        full_name: name.into(),
        position: "Uzman".into(),
        department: "KALİTE".into(),
        badge: badge.into(),
        ..Default::default()
    }
}

#[test]
fn mapping_insert_reads_back_with_bool_as_integer() {
    let (_dir, db) = setup();
    let id = db
        .insert(
            "processes",
            &[
                ("process_name", Value::from("Tedarikçi Denetimi")),
                ("department", Value::from("İKMAL")),
                ("score", Value::from(12)),
                ("weight", Value::from(1.25)),
                ("deleted", Value::from(false)),
            ],
        )
        .unwrap();

    let row = db
        .fetch_optional(
            "SELECT process_name, department, score, weight, deleted FROM processes WHERE id = ?",
            &values![id],
        )
        .unwrap()
        .unwrap();
    assert_eq!(row.get_string("process_name").as_deref(), Some("Tedarikçi Denetimi"));
    assert_eq!(row.get_i64("score"), Some(12));
    assert_eq!(row.get_f64("weight"), Some(1.25));
    assert_eq!(row.get("deleted"), Some(&Value::Integer(0)));
    assert_eq!(row.get("deleted").and_then(Value::as_bool), Some(false));
}

#[test]
fn mutation_reports_affected_rows_and_id() {
    let (_dir, db) = setup();
    let out = db
        .execute(
            "INSERT INTO badges (employee_sicil_no, badge_title, badge_points) VALUES (?, ?, ?)",
            &values!["MDR001", "Öncü", 10],
            false,
        )
        .unwrap();
    assert_matches!(out, QueryOutput::Affected { rows: 1, last_insert_id: Some(_) });

    let out = db.execute("SELECT badge_title FROM badges", &[], true).unwrap();
    assert_eq!(out.into_rows().len(), 1);
}

#[test]
fn stated_score_total_is_preserved() {
    let (_dir, db) = setup();
    let pid = ProcessRepo::create(&db, "Kalite Kontrol", Some("KALİTE"), 0, 1.0).unwrap();
    let id = ProcessScoreRepo::create(
        &db,
        &NewProcessScore {
            process_id: Some(pid),
            employee_name: "Kalite Müdürü".into(),
            employee_badge: Some("MDR002".into()),
            output: 8,
            quality: 7,
            strategy: 6,
            innovation: 5,
            time: 2.5,
            bonus: 1,
            total: 29.5,
            date: "2026-03-01".into(),
            ..Default::default()
        },
    )
    .unwrap();

    let stored = ProcessScoreRepo::get(&db, id).unwrap().unwrap();
    assert_eq!(
        (stored.output, stored.quality, stored.strategy, stored.innovation),
        (8, 7, 6, 5)
    );
    assert!((stored.time - 2.5).abs() < f64::EPSILON);
    assert_eq!(stored.bonus, 1);
    assert!((stored.total - 29.5).abs() < f64::EPSILON);
    assert_eq!(stored.approval, ApprovalState::Pending);
}

#[test]
fn duplicate_badge_fails_and_keeps_original() {
    let (_dir, db) = setup();
    EmployeeRepo::create(&db, &employee("K-77", "Elif Şahin")).unwrap();
    let err = EmployeeRepo::create(&db, &employee("K-77", "Başkası")).unwrap_err();
    assert_matches!(err, StoreError::Statement { .. });

    let kept = EmployeeRepo::find_by_badge(&db, "K-77").unwrap().unwrap();
    assert_eq!(kept.full_name, "Elif Şahin");
}

#[test]
fn soft_delete_flag_controls_visibility() {
    let (_dir, db) = setup();
    EmployeeRepo::create(&db, &employee("N-1", "Null Bayrak")).unwrap();
    EmployeeRepo::create(&db, &employee("D-1", "Silinmiş Kişi")).unwrap();
    db.execute_update("UPDATE employees SET deleted = NULL WHERE Sicil_No = 'N-1'", &[])
        .unwrap();
    db.execute_update("UPDATE employees SET deleted = 1 WHERE Sicil_No = 'D-1'", &[])
        .unwrap();

    let badges: Vec<String> = EmployeeRepo::list_active(&db)
        .unwrap()
        .into_iter()
        .map(|e| e.badge)
        .collect();
    assert!(badges.contains(&"N-1".to_string()));
    assert!(!badges.contains(&"D-1".to_string()));
    assert_eq!(EmployeeRepo::count_active(&db).unwrap(), 5);
}

#[test]
fn transaction_error_rolls_back() {
    let (_dir, db) = setup();
    let result: effinova_store::Result<()> = db.transaction(|tx| {
        tx.execute_update(
            "INSERT INTO badges (badge_title) VALUES (?)",
            &values!["Geçici"],
        )?;
        tx.execute_update("INSERT INTO no_such_table VALUES (1)", &[])?;
        Ok(())
    });
    assert!(result.is_err());
    let n: i64 = db.fetch_scalar("SELECT COUNT(*) FROM badges", &[]).unwrap();
    assert_eq!(n, 0);
}

#[test]
fn dataframe_keeps_column_order() {
    let (_dir, db) = setup();
    let table = db.get_dataframe(
        "SELECT Sicil_No, Ad_Soyad FROM employees ORDER BY Sicil_No",
        &[],
    );
    assert_eq!(table.columns, ["Sicil_No", "Ad_Soyad"]);
    assert_eq!(table.len(), 4);
    assert_eq!(table.value(0, "Sicil_No"), Some(&Value::from("ADM001")));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn process_values_round_trip(
        name in "[A-Za-zÇĞİÖŞÜçğıöşü ]{1,40}",
        score in -1_000_000_i64..1_000_000,
        weight in -1.0e6_f64..1.0e6,
    ) {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let id = db
            .insert(
                "processes",
                &[
                    ("process_name", Value::from(name.as_str())),
                    ("score", Value::from(score)),
                    ("weight", Value::from(weight)),
                ],
            )
            .unwrap();
        let row = db
            .fetch_optional("SELECT process_name, score, weight FROM processes WHERE id = ?", &values![id])
            .unwrap()
            .unwrap();
        prop_assert_eq!(row.get_string("process_name"), Some(name));
        prop_assert_eq!(row.get_i64("score"), Some(score));
        prop_assert_eq!(row.get_f64("weight"), Some(weight));
    }
}
