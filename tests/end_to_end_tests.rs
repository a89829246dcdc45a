use logtriage::anomaly::{AnomalyMatcher, PatternCatalogue};
use logtriage::config::{ClusteringConfig, MatchGranularity, TriageConfig};
use logtriage::diagnostics::DiagnosticKind;
use logtriage::pipeline::run;

const LOG: &[&str] = &[
    "2024-03-01 10:00:00,001 4242 INFO admin odoo.modules.loading: Modules loaded successfully",
    "2024-03-01 10:00:01,002 4242 WARNING admin odoo.fields: Field deprecated in model",
    "2024-03-01 10:00:02,003 4242 ERROR bob odoo.sql_db: bad query syntax near select",
    "2024-03-01 10:00:03,004 4242 ERROR bob odoo.http: Exception in request handler",
    "  File \"/opt/odoo/http.py\", line 640, in dispatch",
    "psycopg2.OperationalError: server closed the connection unexpectedly",
];

fn config(k: usize, match_on: MatchGranularity) -> TriageConfig {
    TriageConfig {
        match_on,
        clustering: ClusteringConfig { clusters: k, ..ClusteringConfig::default() },
        ..TriageConfig::default()
    }
}

fn matcher() -> AnomalyMatcher {
    AnomalyMatcher::new(
        PatternCatalogue::new(&["server closed the connection", "connection refused"]).unwrap(),
        PatternCatalogue::new(&["loaded successfully"]).unwrap(),
    )
}

#[test]
fn reassembles_clusters_and_flags_stack_trace() {
    let out = run(LOG, &config(2, MatchGranularity::Line), &matcher()).unwrap();
    assert_eq!(out.records.len(), 4);
    let last = out.records.last().unwrap();
    assert_eq!(last.message.lines().count(), 3);
    assert_eq!(last.message.lines().next(), Some("Exception in request handler"));

    assert_eq!(out.anomalies.len(), 1);
    assert_eq!(out.anomalies[0].line_number, 6);
    assert_eq!(out.anomalies[0].matched_pattern, "server closed the connection");

    let clustering = out.clustering.as_ref().expect("clustering ran");
    assert_eq!(clustering.analysis.total_records(), out.records.len());
    assert_eq!(clustering.projection.len(), out.records.len());
    assert!(out.records.iter().all(|r| r.cluster.map_or(false, |c| c < 2)));
    assert_eq!(out.summary.total_records, 4);
    assert_eq!(out.summary.total_lines, LOG.len());
    assert!(out.diagnostics.is_empty());
}

#[test]
fn record_granularity_reports_the_record_header() {
    let out = run(LOG, &config(2, MatchGranularity::Record), &matcher()).unwrap();
    assert_eq!(out.anomalies.len(), 1);
    assert_eq!(out.anomalies[0].line_number, 4);
    assert_eq!(out.anomalies[0].raw_line, LOG[3]);
}

#[test]
fn too_few_records_skips_clustering_but_keeps_other_results() {
    let out = run(LOG, &config(5, MatchGranularity::Line), &matcher()).unwrap();
    assert!(out.clustering.is_none());
    assert!(out.records.iter().all(|r| r.cluster.is_none()));
    assert_eq!(out.diagnostics.count(DiagnosticKind::ClusteringSkipped), 1);
    assert_eq!(out.anomalies.len(), 1);
    assert_eq!(out.users.tree.total(), 4);
}

#[test]
fn same_seed_same_labels() {
    let a = run(LOG, &config(2, MatchGranularity::Line), &matcher()).unwrap();
    let b = run(LOG, &config(2, MatchGranularity::Line), &matcher()).unwrap();
    let la: Vec<Option<usize>> = a.records.iter().map(|r| r.cluster).collect();
    let lb: Vec<Option<usize>> = b.records.iter().map(|r| r.cluster).collect();
    assert_eq!(la, lb);
}

#[test]
fn output_serializes_to_json() {
    let out = run(LOG, &config(2, MatchGranularity::Line), &matcher()).unwrap();
    let v: serde_json::Value = serde_json::to_value(&out).unwrap();
    assert_eq!(v["summary"]["total_records"], 4);
    assert_eq!(v["anomalies"][0]["matched_pattern"], "server closed the connection");
    assert!(v["clustering"]["analysis"]["clusters"].is_object());
}

#[test]
fn headerless_log_still_gets_line_anomalies() {
    let lines = [
        "worker-1: upstream timeout after 30s",
        "worker-2: request timeout",
    ];
    let m = AnomalyMatcher::new(
        PatternCatalogue::new(&["timeout"]).unwrap(),
        PatternCatalogue::default(),
    );
    let out = run(&lines, &config(2, MatchGranularity::Line), &m).unwrap();
    assert!(out.records.is_empty());
    assert!(out.clustering.is_none());
    assert_eq!(out.diagnostics.count(DiagnosticKind::NoRecords), 1);
    let hits: Vec<usize> = out.anomalies.iter().map(|a| a.line_number).collect();
    assert_eq!(hits, vec![1, 2]);
    assert_eq!(out.summary.anomalies_count, 2);
}

#[test]
fn raw_user_counts_follow_the_config_switch() {
    let off = run(LOG, &config(2, MatchGranularity::Line), &matcher()).unwrap();
    assert!(off.users.raw_counts.is_none());

    let cfg = TriageConfig { raw_user_counts: true, ..config(2, MatchGranularity::Line) };
    let on = run(LOG, &cfg, &matcher()).unwrap();
    let raw = on.users.raw_counts.as_ref().expect("raw counts requested");
    assert_eq!(raw["admin"].info, 1);
    assert_eq!(raw["admin"].warning, 1);
    assert_eq!(raw["bob"].error, 2);
    assert_eq!(raw["unknown"].error, 1);
    assert_eq!(raw["unknown"].info, 1);
}
