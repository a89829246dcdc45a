use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Samples kept per run; `total` and `by_kind` keep counting past it.
pub const MAX_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    OrphanLine,
    InvalidUtf8,
    ClusteringSkipped,
    NoRecords,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::OrphanLine => "orphan_line",
            DiagnosticKind::InvalidUtf8 => "invalid_utf8",
            DiagnosticKind::ClusteringSkipped => "clustering_skipped",
            DiagnosticKind::NoRecords => "no_records",
        }
    }
}

/// A recoverable problem: the run continued, the affected input was skipped or degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<usize>,
    pub kind: DiagnosticKind,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub total: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub samples: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diag: Diagnostic) {
        self.total += 1;
        *self.by_kind.entry(diag.kind.as_str().to_string()).or_insert(0) += 1;
        if self.samples.len() < MAX_SAMPLES {
            self.samples.push(diag);
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.total += other.total;
        for (kind, n) in other.by_kind {
            *self.by_kind.entry(kind).or_insert(0) += n;
        }
        let room = MAX_SAMPLES.saturating_sub(self.samples.len());
        self.samples.extend(other.samples.into_iter().take(room));
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.by_kind.get(kind.as_str()).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
