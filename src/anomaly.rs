use crate::error::{Result, TriageError};
use crate::parser::LogRecord;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An ordered list of case-insensitive patterns, loaded from a JSON array of strings.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalogue {
    patterns: Vec<(String, Regex)>,
}

impl PatternCatalogue {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns.iter()
            .map(|p| {
                let p = p.as_ref();
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (p.to_string(), re))
                    .map_err(|source| TriageError::Pattern { pattern: p.to_string(), source })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn from_json(path: &Path, contents: &str) -> Result<Self> {
        let raw: Vec<String> = serde_json::from_str(contents)
            .map_err(|source| TriageError::Json { path: path.to_path_buf(), source })?;
        Self::new(&raw)
    }

    /// The matcher cannot run without this catalogue: a missing file is fatal.
    pub fn load_required(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let cat = Self::from_json(path, &contents)?;
                tracing::info!(path = %path.display(), patterns = cat.len(), "loaded known patterns");
                Ok(cat)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TriageError::CatalogueMissing(path.to_path_buf()))
            }
            Err(source) => Err(TriageError::Io { path: path.to_path_buf(), source }),
        }
    }

    /// A missing file yields an empty catalogue.
    pub fn load_optional(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let cat = Self::from_json(path, &contents)?;
                tracing::info!(path = %path.display(), patterns = cat.len(), "loaded false positives");
                Ok(cat)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "false-positive catalogue not found, suppressing nothing");
                Ok(Self::default())
            }
            Err(source) => Err(TriageError::Io { path: path.to_path_buf(), source }),
        }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn any_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|(_, re)| re.is_match(text))
    }

    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.patterns.iter().find(|(_, re)| re.is_match(text)).map(|(p, _)| p.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    pub line_number: usize,
    pub raw_line: String,
    pub matched_pattern: String,
}

impl AnomalyVerdict {
    pub fn report_line(&self) -> String {
        format!("Line {} | Pattern: {} | Log: {}", self.line_number, self.matched_pattern, self.raw_line)
    }
}

/// Text after the final colon, trimmed. Lines without a colon are not matched at all.
pub fn message_portion(line: &str) -> Option<&str> {
    line.rfind(':').map(|pos| line[pos + 1..].trim())
}

pub struct AnomalyMatcher {
    known: PatternCatalogue,
    false_positives: PatternCatalogue,
}

impl AnomalyMatcher {
    pub fn new(known: PatternCatalogue, false_positives: PatternCatalogue) -> Self {
        Self { known, false_positives }
    }

    /// False positives win over every known pattern; among known patterns the first in order wins.
    pub fn match_message(&self, message: &str) -> Option<&str> {
        if self.false_positives.any_match(message) {
            return None;
        }
        self.known.first_match(message)
    }

    pub fn scan_lines<S: AsRef<str>>(&self, lines: &[S]) -> Vec<AnomalyVerdict> {
        let mut out = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim();
            let Some(message) = message_portion(line) else { continue };
            if let Some(pattern) = self.match_message(message) {
                tracing::debug!(line_number = i + 1, pattern, "anomaly");
                out.push(AnomalyVerdict { line_number: i + 1, raw_line: line.to_string(), matched_pattern: pattern.to_string() });
            }
        }
        out
    }

    /// One verdict at most per record: its lines are checked in order with the
    /// same message portion a line scan would use, and the first match wins.
    /// The header line was already split at its module colon, so a first line
    /// without a colon is matched whole.
    pub fn scan_records(&self, records: &[LogRecord]) -> Vec<AnomalyVerdict> {
        records.iter()
            .filter_map(|rec| {
                let mut lines = rec.message.lines();
                let first = lines.next().map(|l| message_portion(l).unwrap_or(l.trim()));
                let pattern = first.into_iter()
                    .chain(lines.filter_map(|l| message_portion(l.trim())))
                    .find_map(|portion| self.match_message(portion))?;
                tracing::debug!(line_number = rec.line_number, pattern, "anomaly");
                Some(AnomalyVerdict {
                    line_number: rec.line_number,
                    raw_line: rec.header.clone(),
                    matched_pattern: pattern.to_string(),
                })
            })
            .collect()
    }
}
