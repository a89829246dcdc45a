use crate::analysis::{self, ClusterAnalysis};
use crate::anomaly::{AnomalyMatcher, AnomalyVerdict};
use crate::config::{MatchGranularity, TriageConfig};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Result, TriageError};
use crate::parser::LogRecord;
use crate::tokens::{self, CategoryCounts, UserTree};
use crate::{kmeans, multiline, projection, vectorizer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub generated_at: String,
    pub total_lines: usize,
    pub total_records: usize,
    pub clusters_count: usize,
    pub anomalies_count: usize,
    pub vocabulary_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringOut {
    pub k: usize,
    pub iterations: usize,
    pub inertia: f64,
    pub vocabulary_size: usize,
    pub analysis: ClusterAnalysis,
    /// One 2-D point per record, same order as `records`.
    pub projection: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersOut {
    pub counts: BTreeMap<String, CategoryCounts>,
    pub tree: UserTree,
    /// Per-user tallies over raw lines, present when `raw_user_counts` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_counts: Option<BTreeMap<String, CategoryCounts>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageOutput {
    pub summary: Summary,
    pub records: Vec<LogRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clustering: Option<ClusteringOut>,
    pub users: UsersOut,
    pub anomalies: Vec<AnomalyVerdict>,
    pub diagnostics: Diagnostics,
}

/// Runs every phase over already-decoded lines. Each phase consumes the full
/// output of the one before it. A log with no recognisable header still gets
/// its line-level anomaly scan; only the record phases are skipped.
pub fn run<S: AsRef<str>>(lines: &[S], config: &TriageConfig, matcher: &AnomalyMatcher) -> Result<TriageOutput> {
    config.validate()?;
    let mut diagnostics = Diagnostics::default();

    let assembly = multiline::assemble(lines, config.grammar);
    diagnostics.extend(assembly.diagnostics);
    let mut records = assembly.records;

    let clustering = match cluster_records(&mut records, config) {
        Ok(out) => Some(out),
        Err(TriageError::NoRecords) => {
            tracing::warn!(lines = lines.len(), "no line matches the header grammar");
            diagnostics.push(Diagnostic {
                line_number: None,
                kind: DiagnosticKind::NoRecords,
                detail: TriageError::NoRecords.to_string(),
            });
            None
        }
        Err(e @ (TriageError::InsufficientRecords { .. } | TriageError::EmptyVocabulary)) => {
            tracing::warn!(error = %e, "clustering skipped");
            diagnostics.push(Diagnostic { line_number: None, kind: DiagnosticKind::ClusteringSkipped, detail: e.to_string() });
            None
        }
        Err(e) => return Err(e),
    };

    let tree = UserTree::build(&records);
    let raw_counts = config.raw_user_counts.then(|| tokens::raw_line_counts(lines));
    let users = UsersOut { counts: tree.counts(), tree, raw_counts };

    let anomalies = match config.match_on {
        MatchGranularity::Line => matcher.scan_lines(lines),
        MatchGranularity::Record => matcher.scan_records(&records),
    };
    tracing::info!(anomalies = anomalies.len(), diagnostics = diagnostics.total, "analysis complete");

    let summary = Summary {
        generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        total_lines: lines.len(),
        total_records: records.len(),
        clusters_count: clustering.as_ref().map_or(0, |c| c.analysis.clusters.len()),
        anomalies_count: anomalies.len(),
        vocabulary_size: clustering.as_ref().map_or(0, |c| c.vocabulary_size),
    };

    Ok(TriageOutput { summary, records, clustering, users, anomalies, diagnostics })
}

/// Vectorizes, clusters, labels `records` in place and aggregates the clusters.
fn cluster_records(records: &mut [LogRecord], config: &TriageConfig) -> Result<ClusteringOut> {
    if records.is_empty() {
        return Err(TriageError::NoRecords);
    }
    let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
    let (model, matrix) = vectorizer::fit_transform(&messages, &config.vectorizer)?;
    tracing::info!(records = records.len(), vocabulary = model.vocabulary.len(), "vectorized messages");

    let result = kmeans::kmeans(&matrix, &config.clustering)?;
    for (rec, &label) in records.iter_mut().zip(&result.labels) {
        rec.cluster = Some(label);
    }
    let analysis = analysis::analyze_clusters(records, config.fingerprint_tokens, config.sample_message_chars)?;
    tracing::info!(k = config.clustering.clusters, iterations = result.iterations, inertia = result.inertia, "clustered records");
    Ok(ClusteringOut {
        k: config.clustering.clusters,
        iterations: result.iterations,
        inertia: result.inertia,
        vocabulary_size: model.vocabulary.len(),
        analysis,
        projection: projection::project_2d(&matrix),
    })
}
