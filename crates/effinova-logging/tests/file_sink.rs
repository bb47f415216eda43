#![allow(missing_docs, unused_results)]

use effinova_logging::file_subscriber;

#[test]
fn file_sink_writes_timestamped_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("config.log");
    let subscriber = file_subscriber("info", &path, false).unwrap();

    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(table = "employees", "bootstrap complete");
        tracing::debug!("filtered out at info level");
    });

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1, "unexpected log content: {content}");
    assert!(lines[0].contains("INFO"));
    assert!(lines[0].contains("bootstrap complete"));
    assert!(lines[0].contains("table=\"employees\""));
    // Lines start with an RFC 3339 timestamp like 2026-01-01T00:00:00.000000Z
    assert!(lines[0].chars().take(4).all(|c| c.is_ascii_digit()));
    assert!(!lines[0].contains('\u{1b}'), "file output must not contain ANSI escapes");
}
