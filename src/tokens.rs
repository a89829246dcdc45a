use crate::parser::LogRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static RE_USER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d+\s+\d+\s+(INFO|ERROR|WARNING)\s+(\w+)").unwrap()
});

const NEGATED: &[&str] = &["no error", "without error", "no exception"];
const ERROR_WORDS: &[&str] = &["error", "exception", "failed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Error,
    Warning,
    Info,
}

/// Keyword category of free text, independent of the declared level.
pub fn categorize(text: &str) -> Category {
    let lower = text.to_lowercase();
    if NEGATED.iter().any(|n| lower.contains(n)) {
        return Category::Info;
    }
    if ERROR_WORDS.iter().any(|w| lower.contains(w)) {
        Category::Error
    } else if lower.contains("warning") {
        Category::Warning
    } else {
        Category::Info
    }
}

/// Lowercased user of a raw header line, searched anywhere in the line; `unknown` otherwise.
pub fn extract_user(line: &str) -> String {
    RE_USER.captures(line)
        .and_then(|c| c.get(2))
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageNode {
    pub line_number: usize,
    pub text: String,
}

/// Never empty: a level node exists only once a message has been filed under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelNode {
    pub category: Category,
    pub messages: Vec<MessageNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNode {
    pub user: String,
    pub levels: Vec<LevelNode>,
}

impl UserNode {
    pub fn count(&self, category: Category) -> usize {
        self.levels.iter().find(|l| l.category == category).map_or(0, |l| l.messages.len())
    }

    pub fn total(&self) -> usize {
        self.levels.iter().map(|l| l.messages.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTree {
    pub users: Vec<UserNode>,
}

impl UserTree {
    /// Users sorted by name (case preserved); levels in error, warning, info order.
    pub fn build(records: &[LogRecord]) -> Self {
        let mut grouped: BTreeMap<&str, BTreeMap<Category, Vec<MessageNode>>> = BTreeMap::new();
        for rec in records {
            let category = categorize(&format!("{} {}", rec.header, rec.message));
            grouped.entry(rec.user.as_str())
                .or_default()
                .entry(category)
                .or_default()
                .push(MessageNode { line_number: rec.line_number, text: rec.first_line().to_string() });
        }
        let users = grouped.into_iter()
            .map(|(user, levels)| UserNode {
                user: user.to_string(),
                levels: levels.into_iter()
                    .map(|(category, messages)| LevelNode { category, messages })
                    .collect(),
            })
            .collect();
        UserTree { users }
    }

    pub fn counts(&self) -> BTreeMap<String, CategoryCounts> {
        self.users.iter()
            .map(|u| (u.user.clone(), CategoryCounts {
                error: u.count(Category::Error),
                warning: u.count(Category::Warning),
                info: u.count(Category::Info),
            }))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.users.iter().map(UserNode::total).sum()
    }

    pub fn find(&self, user: &str) -> Option<&UserNode> {
        self.users.iter().find(|u| u.user == user)
    }
}

/// Per-user tallies straight from physical lines, for logs whose headers do not
/// follow the strict grammar. Every non-blank line is counted once.
pub fn raw_line_counts<S: AsRef<str>>(lines: &[S]) -> BTreeMap<String, CategoryCounts> {
    let mut out: BTreeMap<String, CategoryCounts> = BTreeMap::new();
    for line in lines.iter().map(|l| l.as_ref().trim()).filter(|l| !l.is_empty()) {
        let counts = out.entry(extract_user(line)).or_default();
        match categorize(line) {
            Category::Error => counts.error += 1,
            Category::Warning => counts.warning += 1,
            Category::Info => counts.info += 1,
        }
    }
    out
}
