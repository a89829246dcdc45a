use crate::error::{Result, TriageError};
use crate::parser::LogRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSample {
    pub line_number: usize,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub total: usize,
    pub per_level: BTreeMap<String, usize>,
    pub error_fingerprints: BTreeSet<String>,
    pub sample: ClusterSample,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAnalysis {
    pub clusters: BTreeMap<usize, ClusterStats>,
}

impl ClusterAnalysis {
    pub fn total_records(&self) -> usize {
        self.clusters.values().map(|c| c.total).sum()
    }
}

/// First `tokens` whitespace-separated words of `message`, single-spaced.
pub fn fingerprint(message: &str, tokens: usize) -> String {
    message.split_whitespace().take(tokens).collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// One pass over clustered records: totals, per-level counts, error
/// fingerprints and the first record of each cluster as its sample.
pub fn analyze_clusters(records: &[LogRecord], fingerprint_tokens: usize, sample_chars: usize) -> Result<ClusterAnalysis> {
    if records.is_empty() {
        return Err(TriageError::NoRecords);
    }
    let mut clusters: BTreeMap<usize, ClusterStats> = BTreeMap::new();
    for rec in records {
        let label = rec.cluster.ok_or(TriageError::Unclustered(rec.line_number))?;
        let stats = clusters.entry(label).or_insert_with(|| ClusterStats {
            total: 0,
            per_level: BTreeMap::new(),
            error_fingerprints: BTreeSet::new(),
            sample: ClusterSample {
                line_number: rec.line_number,
                level: rec.level.clone(),
                message: truncate_chars(&rec.message, sample_chars),
            },
        });
        stats.total += 1;
        *stats.per_level.entry(rec.level.clone()).or_insert(0) += 1;
        if rec.is_error() {
            stats.error_fingerprints.insert(fingerprint(&rec.message, fingerprint_tokens));
        }
    }
    Ok(ClusterAnalysis { clusters })
}
