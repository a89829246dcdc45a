use logtriage::config::GrammarVariant;
use logtriage::parser::{classify_line, LineKind};

#[test]
fn classifies_header_with_pid() {
    let line = "2024-03-01 10:15:02,123 4242 INFO admin odoo.modules.loading: loading 42 modules";
    match classify_line(line, GrammarVariant::WithPid) {
        LineKind::RecordStart(h) => {
            assert_eq!(h.timestamp, "2024-03-01 10:15:02,123");
            assert_eq!(h.pid, Some(4242));
            assert_eq!(h.level, "INFO");
            assert_eq!(h.user, "admin");
            assert_eq!(h.module, "odoo.modules.loading");
            assert_eq!(h.message, "loading 42 modules");
        }
        other => panic!("expected record start, got {other:?}"),
    }
}

#[test]
fn strips_surrounding_whitespace_before_classifying() {
    let line = "   2024-03-01 10:15:02,123 1 WARNING Bob odoo.http: slow request  \t";
    match classify_line(line, GrammarVariant::WithPid) {
        LineKind::RecordStart(h) => {
            assert_eq!(h.user, "Bob");
            assert_eq!(h.message, "slow request");
        }
        other => panic!("expected record start, got {other:?}"),
    }
}

#[test]
fn blank_lines_are_neither_start_nor_continuation() {
    assert_eq!(classify_line("", GrammarVariant::WithPid), LineKind::Blank);
    assert_eq!(classify_line("   \t ", GrammarVariant::OptionalPid), LineKind::Blank);
}

#[test]
fn stack_frames_are_continuations() {
    let line = "  File \"/opt/odoo/http.py\", line 12, in dispatch";
    assert_eq!(
        classify_line(line, GrammarVariant::WithPid),
        LineKind::Continuation("File \"/opt/odoo/http.py\", line 12, in dispatch".to_string())
    );
}

#[test]
fn missing_pid_only_accepted_by_optional_grammar() {
    let line = "2024-03-01 10:15:02,123 ERROR admin odoo.sql_db: bad query";
    assert!(matches!(classify_line(line, GrammarVariant::WithPid), LineKind::Continuation(_)));
    match classify_line(line, GrammarVariant::OptionalPid) {
        LineKind::RecordStart(h) => {
            assert_eq!(h.pid, None);
            assert_eq!(h.level, "ERROR");
            assert_eq!(h.user, "admin");
            assert_eq!(h.module, "odoo.sql_db");
        }
        other => panic!("expected record start, got {other:?}"),
    }
}

#[test]
fn optional_grammar_still_captures_pid() {
    let line = "2024-03-01 10:15:02,123 77 INFO ? werkzeug: GET /web";
    // `?` is not a word token, so this is not a header under either grammar
    assert!(matches!(classify_line(line, GrammarVariant::OptionalPid), LineKind::Continuation(_)));
    let line = "2024-03-01 10:15:02,123 77 INFO db1 werkzeug: GET /web";
    match classify_line(line, GrammarVariant::OptionalPid) {
        LineKind::RecordStart(h) => assert_eq!(h.pid, Some(77)),
        other => panic!("expected record start, got {other:?}"),
    }
}

#[test]
fn unknown_level_passes_through_verbatim() {
    let line = "2024-03-01 10:15:02,123 5 CRITICAL db1 odoo.service: shutting down";
    match classify_line(line, GrammarVariant::WithPid) {
        LineKind::RecordStart(h) => assert_eq!(h.level, "CRITICAL"),
        other => panic!("expected record start, got {other:?}"),
    }
}

#[test]
fn header_without_colon_is_continuation() {
    let line = "2024-03-01 10:15:02,123 5 INFO db1 odoo.service shutting down";
    assert!(matches!(classify_line(line, GrammarVariant::WithPid), LineKind::Continuation(_)));
}
