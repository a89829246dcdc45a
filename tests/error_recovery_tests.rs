use logtriage::anomaly::{AnomalyMatcher, PatternCatalogue};
use logtriage::config::TriageConfig;
use logtriage::diagnostics::DiagnosticKind;
use logtriage::error::TriageError;
use logtriage::pipeline::run;
use logtriage::source::read_log_file;

fn empty_matcher() -> AnomalyMatcher {
    AnomalyMatcher::new(PatternCatalogue::new(&["timeout"]).unwrap(), PatternCatalogue::default())
}

#[test]
fn missing_input_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_log_file(&dir.path().join("odoo.log")).unwrap_err();
    assert!(matches!(err, TriageError::InputMissing(_)));
}

#[test]
fn binary_file_is_an_encoding_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odoo.log");
    std::fs::write(&path, [0xffu8, 0xfe, 0x00, b'\n', 0xc3, 0x28]).unwrap();
    assert!(matches!(read_log_file(&path), Err(TriageError::Encoding(_))));
}

#[test]
fn bad_line_does_not_abort_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odoo.log");
    let mut bytes = b"2024-03-01 10:00:00,001 1 INFO admin odoo.a: first\n".to_vec();
    bytes.extend_from_slice(b"caf\xe9 continuation\n");
    bytes.extend_from_slice(b"2024-03-01 10:00:01,001 1 ERROR admin odoo.a: connection timeout\n");
    std::fs::write(&path, bytes).unwrap();

    let decoded = read_log_file(&path).unwrap();
    assert_eq!(decoded.lines.len(), 3);
    assert_eq!(decoded.diagnostics.count(DiagnosticKind::InvalidUtf8), 1);

    let mut cfg = TriageConfig::default();
    cfg.clustering.clusters = 2;
    let out = run(&decoded.lines, &cfg, &empty_matcher()).unwrap();
    assert_eq!(out.records.len(), 2);
    assert!(out.records[0].message.starts_with("first\ncaf"));
    assert_eq!(out.anomalies.len(), 1);
}

#[test]
fn orphans_are_counted_alongside_results() {
    let lines = [
        "stray text",
        "2024-03-01 10:00:00,001 1 INFO admin odoo.a: started",
        "2024-03-01 10:00:01,001 1 INFO admin odoo.a: connection timeout",
    ];
    let mut cfg = TriageConfig::default();
    cfg.clustering.clusters = 2;
    let out = run(&lines, &cfg, &empty_matcher()).unwrap();
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.diagnostics.count(DiagnosticKind::OrphanLine), 1);
    assert_eq!(out.diagnostics.total, 1);
}

#[test]
fn no_records_is_reported_as_diagnostic() {
    let lines = ["nothing that looks like a header", "", "still nothing"];
    let out = run(&lines, &TriageConfig::default(), &empty_matcher()).unwrap();
    assert!(out.records.is_empty());
    assert!(out.clustering.is_none());
    assert_eq!(out.users.tree.total(), 0);
    assert_eq!(out.diagnostics.count(DiagnosticKind::NoRecords), 1);
    assert_eq!(out.summary.total_records, 0);
}

#[test]
fn invalid_config_is_rejected_before_processing() {
    let mut cfg = TriageConfig::default();
    cfg.clustering.clusters = 0;
    let lines = ["2024-03-01 10:00:00,001 1 INFO admin odoo.a: started"];
    assert!(matches!(run(&lines, &cfg, &empty_matcher()), Err(TriageError::Config(_))));
}

#[test]
fn config_file_round_trip_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triage.json");
    std::fs::write(&path, r#"{"grammar":"optional_pid","clustering":{"clusters":3,"seed":7}}"#).unwrap();
    let cfg = TriageConfig::load(&path).unwrap();
    assert_eq!(cfg.clustering.clusters, 3);
    assert_eq!(cfg.clustering.seed, 7);
    assert_eq!(cfg.clustering.max_iter, 300);

    std::fs::write(&path, r#"{"clustering":{"clusters":0}}"#).unwrap();
    assert!(matches!(TriageConfig::load(&path), Err(TriageError::Config(_))));
}
