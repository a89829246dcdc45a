use crate::config::GrammarVariant;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::parser::{self, LineKind, LogRecord};

/// Folds physical lines into records. A header line closes the open record and
/// opens a new one; any other non-blank line extends the open record.
#[derive(Debug, Default)]
pub struct RecordAssembler {
    grammar: GrammarVariant,
    current: Option<LogRecord>,
    diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub records: Vec<LogRecord>,
    pub diagnostics: Diagnostics,
}

impl RecordAssembler {
    pub fn new(grammar: GrammarVariant) -> Self {
        Self { grammar, current: None, diagnostics: Diagnostics::default() }
    }

    /// Feeds one physical line. Returns the record that this line closed, if any.
    pub fn push(&mut self, line_number: usize, line: &str) -> Option<LogRecord> {
        match parser::classify_line(line, self.grammar) {
            LineKind::Blank => None,
            LineKind::RecordStart(head) => {
                let opened = LogRecord::from_head(head, line_number, line.trim());
                self.current.replace(opened)
            }
            LineKind::Continuation(text) => {
                match self.current.as_mut() {
                    Some(rec) => rec.append_line(&text),
                    None => {
                        tracing::warn!(line_number, "line ignored: no record open yet");
                        self.diagnostics.push(Diagnostic {
                            line_number: Some(line_number),
                            kind: DiagnosticKind::OrphanLine,
                            detail: text,
                        });
                    }
                }
                None
            }
        }
    }

    pub fn finish(&mut self) -> Option<LogRecord> {
        self.current.take()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

/// Assembles a whole file. Line numbers are 1-based positions in `lines`.
pub fn assemble<S: AsRef<str>>(lines: &[S], grammar: GrammarVariant) -> Assembly {
    let mut agg = RecordAssembler::new(grammar);
    let mut records = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if let Some(rec) = agg.push(i + 1, line.as_ref()) { records.push(rec); }
    }
    if let Some(rec) = agg.finish() { records.push(rec); }
    tracing::info!(records = records.len(), orphans = agg.diagnostics().total, "assembled records");
    Assembly { records, diagnostics: agg.into_diagnostics() }
}
