use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Result, TriageError};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct DecodedLines {
    pub lines: Vec<String>,
    pub diagnostics: Diagnostics,
}

pub fn read_log_file(path: &Path) -> Result<DecodedLines> {
    let bytes = std::fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => TriageError::InputMissing(path.to_path_buf()),
        _ => TriageError::Io { path: path.to_path_buf(), source },
    })?;
    let decoded = decode_lines(&bytes);
    let clean = decoded.lines.len() - decoded.diagnostics.count(DiagnosticKind::InvalidUtf8);
    if !bytes.is_empty() && clean == 0 {
        return Err(TriageError::Encoding(path.to_path_buf()));
    }
    tracing::info!(path = %path.display(), lines = decoded.lines.len(), "read log file");
    Ok(decoded)
}

/// Splits on `\n`, dropping a trailing `\r`. Lines that are not valid UTF-8 are
/// decoded lossily and reported instead of failing the whole file.
pub fn decode_lines(bytes: &[u8]) -> DecodedLines {
    let mut out = DecodedLines::default();
    if bytes.is_empty() { return out; }
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    for (i, raw) in body.split(|b| *b == b'\n').enumerate() {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        match std::str::from_utf8(raw) {
            Ok(s) => out.lines.push(s.to_string()),
            Err(e) => {
                let line_number = i + 1;
                tracing::warn!(line_number, "invalid UTF-8, decoding lossily");
                out.diagnostics.push(Diagnostic {
                    line_number: Some(line_number),
                    kind: DiagnosticKind::InvalidUtf8,
                    detail: e.to_string(),
                });
                out.lines.push(String::from_utf8_lossy(raw).into_owned());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_line_numbers_across_bad_bytes() {
        let bytes = b"first\r\nbad \xff here\nthird\n";
        let out = decode_lines(bytes);
        assert_eq!(out.lines.len(), 3);
        assert_eq!(out.lines[0], "first");
        assert!(out.lines[1].starts_with("bad "));
        assert_eq!(out.lines[2], "third");
        assert_eq!(out.diagnostics.count(DiagnosticKind::InvalidUtf8), 1);
        assert_eq!(out.diagnostics.samples[0].line_number, Some(2));
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert!(decode_lines(b"").lines.is_empty());
    }
}
