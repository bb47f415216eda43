//! Complete `MySQL` schema.
//!
//! `MySQL` has no migration history: each table is created complete with
//! native `ENUM` columns generated from the value-set enums, so both
//! dialects accept exactly the same labels.

use crate::schema::{ApprovalState, IdeaStatus, ProjectStatus, Role, sql_enum_list};

const TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

fn enum_of<T: Copy + 'static>(all: &'static [T], label: fn(T) -> &'static str) -> String {
    sql_enum_list(all.iter().map(move |v| label(*v)))
}

/// `CREATE TABLE IF NOT EXISTS` statements, one per entity table, in
/// creation order (parents before children).
pub fn create_table_statements() -> Vec<(&'static str, String)> {
    let roles = enum_of(Role::ALL, Role::as_sql);
    let approval = enum_of(ApprovalState::ALL, ApprovalState::as_sql);
    let idea = enum_of(IdeaStatus::ALL, IdeaStatus::as_sql);
    let project = enum_of(ProjectStatus::ALL, ProjectStatus::as_sql);

    vec![
        (
            "users",
            format!(
                "CREATE TABLE IF NOT EXISTS users (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    username VARCHAR(50) UNIQUE NOT NULL,
                    password VARCHAR(255) NOT NULL,
                    role ENUM({roles}) DEFAULT '{role_default}',
                    email VARCHAR(100),
                    score INT DEFAULT 0,
                    last_login TIMESTAMP NULL,
                    token VARCHAR(255),
                    employee_sicil_no VARCHAR(20),
                    department VARCHAR(100),
                    deleted BOOLEAN DEFAULT FALSE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    INDEX idx_username (username),
                    INDEX idx_sicil_no (employee_sicil_no)
                ) {TABLE_OPTIONS}",
                role_default = Role::default().as_sql(),
            ),
        ),
        (
            "employees",
            format!(
                "CREATE TABLE IF NOT EXISTS employees (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    Ad_Soyad VARCHAR(100) NOT NULL,
                    Pozisyon VARCHAR(100) NOT NULL,
                    Departman VARCHAR(100) NOT NULL,
                    Yonetici_Adi VARCHAR(100),
                    Email VARCHAR(100),
                    Sicil_No VARCHAR(20) UNIQUE NOT NULL,
                    `İşe_Giriş_Tarihi` DATE,
                    Telefon VARCHAR(20),
                    Adres TEXT,
                    Dogum_Tarihi DATE,
                    Egitim TEXT,
                    Sertifikalar TEXT,
                    Yetenekler TEXT,
                    deleted BOOLEAN DEFAULT FALSE,
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                    INDEX idx_sicil_no (Sicil_No),
                    INDEX idx_departman (Departman)
                ) {TABLE_OPTIONS}"
            ),
        ),
        (
            "processes",
            format!(
                "CREATE TABLE IF NOT EXISTS processes (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    process_name VARCHAR(200) NOT NULL,
                    description TEXT,
                    department VARCHAR(100),
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    score INT DEFAULT 0,
                    weight DECIMAL(3,2) DEFAULT 1.0,
                    deleted BOOLEAN DEFAULT FALSE,
                    INDEX idx_department (department)
                ) {TABLE_OPTIONS}"
            ),
        ),
        (
            "process_scores",
            format!(
                "CREATE TABLE IF NOT EXISTS process_scores (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    employee_name VARCHAR(100) NOT NULL,
                    employee_sicil_no VARCHAR(20),
                    process_id INT,
                    tarih DATE NOT NULL,
                    cikti INT DEFAULT 0,
                    kalite INT DEFAULT 0,
                    strateji INT DEFAULT 0,
                    inovasyon INT DEFAULT 0,
                    zaman DECIMAL(10,2) DEFAULT 0,
                    ekstra INT DEFAULT 0,
                    ekstra_aciklama TEXT,
                    toplam_skor DECIMAL(10,2) DEFAULT 0,
                    onay ENUM({approval}) DEFAULT '{approval_default}',
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    FOREIGN KEY (process_id) REFERENCES processes(id) ON DELETE CASCADE,
                    INDEX idx_employee (employee_sicil_no),
                    INDEX idx_tarih (tarih)
                ) {TABLE_OPTIONS}",
                approval_default = ApprovalState::default().as_sql(),
            ),
        ),
        (
            "innovation_ideas",
            format!(
                "CREATE TABLE IF NOT EXISTS innovation_ideas (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    employee_sicil_no VARCHAR(20),
                    employee_name VARCHAR(100) NOT NULL,
                    idea TEXT NOT NULL,
                    description TEXT,
                    category VARCHAR(100),
                    created_at DATE DEFAULT (CURRENT_DATE),
                    status ENUM({idea}) DEFAULT '{idea_default}',
                    score INT DEFAULT 0,
                    reviewed_by VARCHAR(50),
                    reviewed_at TIMESTAMP NULL,
                    INDEX idx_employee (employee_sicil_no),
                    INDEX idx_status (status)
                ) {TABLE_OPTIONS}",
                idea_default = IdeaStatus::default().as_sql(),
            ),
        ),
        (
            "badges",
            format!(
                "CREATE TABLE IF NOT EXISTS badges (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    employee_sicil_no VARCHAR(20),
                    badge_title VARCHAR(100) NOT NULL,
                    badge_emoji VARCHAR(10) DEFAULT '🏅',
                    badge_points INT DEFAULT 0,
                    badge_description TEXT,
                    awarded_date DATE DEFAULT (CURRENT_DATE),
                    awarded_by VARCHAR(50),
                    INDEX idx_employee (employee_sicil_no)
                ) {TABLE_OPTIONS}"
            ),
        ),
        (
            "projects",
            format!(
                "CREATE TABLE IF NOT EXISTS projects (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    name VARCHAR(200) NOT NULL,
                    description TEXT,
                    start_date DATE,
                    end_date DATE,
                    status ENUM({project}) DEFAULT '{project_default}',
                    budget DECIMAL(15,2) DEFAULT 0,
                    manager_sicil_no VARCHAR(20),
                    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    INDEX idx_status (status),
                    INDEX idx_manager (manager_sicil_no)
                ) {TABLE_OPTIONS}",
                project_default = ProjectStatus::default().as_sql(),
            ),
        ),
        (
            "logs",
            format!(
                "CREATE TABLE IF NOT EXISTS logs (
                    id INT AUTO_INCREMENT PRIMARY KEY,
                    username VARCHAR(50),
                    action VARCHAR(200) NOT NULL,
                    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                    details TEXT,
                    ip_address VARCHAR(45),
                    user_agent TEXT,
                    table_name VARCHAR(50),
                    record_id VARCHAR(50),
                    INDEX idx_username (username),
                    INDEX idx_timestamp (timestamp)
                ) {TABLE_OPTIONS}"
            ),
        ),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ENTITY_TABLES;

    #[test]
    fn one_statement_per_entity_table() {
        let names: Vec<&str> = create_table_statements().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, ENTITY_TABLES);
    }

    #[test]
    fn enums_carry_every_label() {
        let statements = create_table_statements();
        let users = &statements[0].1;
        assert!(users.contains("ENUM('admin','mudur','calisan','gmy') DEFAULT 'calisan'"));
        let projects = &statements[6].1;
        assert!(projects.contains("'In Progress'"));
        assert!(projects.contains("DEFAULT 'Planning'"));
        let ideas = &statements[4].1;
        assert!(ideas.contains("'Değerlendiriliyor'"));
    }

    #[test]
    fn every_table_is_innodb_utf8mb4() {
        for (name, sql) in create_table_statements() {
            assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS"), "{name}");
            assert!(sql.ends_with(TABLE_OPTIONS), "{name}");
        }
    }

    #[test]
    fn scores_cascade_with_their_process() {
        let statements = create_table_statements();
        assert!(statements[3].1.contains("REFERENCES processes(id) ON DELETE CASCADE"));
    }
}
