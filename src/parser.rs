use crate::config::GrammarVariant;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

// TIMESTAMP PID LEVEL USER MODULE: MESSAGE
static RE_HEADER_WITH_PID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d+)\s+(\d+)\s+(\w+)\s+(\w+)\s+([\w.]+):\s+(.*)$").unwrap()
});

static RE_HEADER_OPTIONAL_PID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d+)\s+(?:(\d+)\s+)?(\w+)\s+(\w+)\s+([\w.]+):\s+(.*)$").unwrap()
});

/// Header fields of a line that opens a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHead {
    pub timestamp: String,
    pub pid: Option<u32>,
    pub level: String,
    pub user: String,
    pub module: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    RecordStart(RecordHead),
    Continuation(String),
}

/// One logical log entry: a header line plus any continuation lines that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub line_number: usize,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub level: String,
    pub user: String,
    pub module: String,
    pub message: String,
    pub header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
}

impl LogRecord {
    pub fn from_head(head: RecordHead, line_number: usize, header: &str) -> Self {
        LogRecord {
            line_number,
            timestamp: head.timestamp,
            pid: head.pid,
            level: head.level,
            user: head.user,
            module: head.module,
            message: head.message,
            header: header.to_string(),
            cluster: None,
        }
    }

    pub fn append_line(&mut self, text: &str) {
        self.message.push('\n');
        self.message.push_str(text);
    }

    pub fn is_error(&self) -> bool {
        self.level == "ERROR"
    }

    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

pub fn header_regex(grammar: GrammarVariant) -> &'static Regex {
    match grammar {
        GrammarVariant::WithPid => &RE_HEADER_WITH_PID,
        GrammarVariant::OptionalPid => &RE_HEADER_OPTIONAL_PID,
    }
}

pub fn classify_line(line: &str, grammar: GrammarVariant) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    match header_regex(grammar).captures(trimmed) {
        Some(caps) => LineKind::RecordStart(head_from_captures(&caps)),
        None => LineKind::Continuation(trimmed.to_string()),
    }
}

fn head_from_captures(caps: &Captures<'_>) -> RecordHead {
    let field = |i: usize| caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default();
    RecordHead {
        timestamp: field(1),
        // pids wider than u32 are kept out rather than rejecting the header
        pid: caps.get(2).and_then(|m| m.as_str().parse().ok()),
        level: field(3),
        user: field(4),
        module: field(5),
        message: field(6),
    }
}
