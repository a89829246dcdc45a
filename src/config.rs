use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which header grammar marks the start of a record.
///
/// `WithPid` expects `TIMESTAMP PID LEVEL USER MODULE: MESSAGE`. `OptionalPid`
/// accepts the same header with the pid left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarVariant {
    #[default]
    WithPid,
    OptionalPid,
}

/// What the anomaly matcher scans: every physical line, or every assembled record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchGranularity {
    #[default]
    Line,
    Record,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub max_features: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
    /// `None` uses the built-in English list.
    pub stop_words: Option<Vec<String>>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self { max_features: 1000, ngram_min: 1, ngram_max: 2, stop_words: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub clusters: usize,
    pub max_iter: usize,
    pub seed: u64,
    pub n_init: usize,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self { clusters: 5, max_iter: 300, seed: 42, n_init: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub grammar: GrammarVariant,
    pub match_on: MatchGranularity,
    pub vectorizer: VectorizerConfig,
    pub clustering: ClusteringConfig,
    /// Number of leading message tokens kept as an error fingerprint.
    pub fingerprint_tokens: usize,
    pub sample_message_chars: usize,
    /// Also tally users straight from raw lines with the tolerant header search.
    pub raw_user_counts: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            grammar: GrammarVariant::default(),
            match_on: MatchGranularity::default(),
            vectorizer: VectorizerConfig::default(),
            clustering: ClusteringConfig::default(),
            fingerprint_tokens: 5,
            sample_message_chars: 200,
            raw_user_counts: false,
        }
    }
}

impl TriageConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| TriageError::Io { path: path.to_path_buf(), source })?;
        let config: TriageConfig = serde_json::from_str(&contents)
            .map_err(|source| TriageError::Json { path: path.to_path_buf(), source })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let v = &self.vectorizer;
        let c = &self.clustering;
        if c.clusters == 0 { return Err(TriageError::Config("clusters must be at least 1".into())); }
        if c.max_iter == 0 { return Err(TriageError::Config("max_iter must be at least 1".into())); }
        if c.n_init == 0 { return Err(TriageError::Config("n_init must be at least 1".into())); }
        if v.max_features == 0 { return Err(TriageError::Config("max_features must be at least 1".into())); }
        if v.ngram_min == 0 || v.ngram_min > v.ngram_max {
            return Err(TriageError::Config(format!(
                "invalid n-gram range {}..={}", v.ngram_min, v.ngram_max
            )));
        }
        if self.fingerprint_tokens == 0 {
            return Err(TriageError::Config("fingerprint_tokens must be at least 1".into()));
        }
        Ok(())
    }
}
