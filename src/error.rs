use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("log file not found: {}", .0.display())]
    InputMissing(PathBuf),
    #[error("pattern catalogue not found: {}", .0.display())]
    CatalogueMissing(PathBuf),
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{} is not UTF-8 text (no line decodes cleanly)", .0.display())]
    Encoding(PathBuf),
    #[error("no log records found")]
    NoRecords,
    #[error("need at least {needed} records to form {clusters} clusters, got {got}")]
    InsufficientRecords { got: usize, needed: usize, clusters: usize },
    #[error("vocabulary is empty: every message reduced to stop words")]
    EmptyVocabulary,
    #[error("record at line {0} has no cluster label")]
    Unclustered(usize),
}

pub type Result<T> = std::result::Result<T, TriageError>;
