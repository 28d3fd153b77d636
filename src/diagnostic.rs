//! Diagnostic line classifier
//!
//! Turns one line of compiler/runtime output into a [`Diagnostic`]. A line
//! carries a source reference when it has the shape
//!
//! ```text
//! [prefix ]<basename>.ad(s|b):<row>[:<column>][: <token>:][rest]
//! ```
//!
//! The matcher is hand-written so the accepted grammar is exactly the one
//! above; anything else passes through as plain text.

use serde::Serialize;

use crate::strings::INTERNAL_ERROR_MESSAGE;

/// Position of a diagnostic in a source file. Column 0 means unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub row: u32,
    pub column: u32,
}

/// Routing class of a classified line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
    InternalError,
    Plain,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::InternalError => "internal_error",
            Severity::Plain => "plain",
        }
    }
}

/// One classified line of output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub location: Option<SourceLocation>,
    pub severity: Severity,
    /// Severity token exactly as printed (`warning`, `style`, ...)
    pub token: Option<String>,
    pub raw_text: String,
}

impl Diagnostic {
    fn plain(line: &str) -> Self {
        Self {
            location: None,
            severity: Severity::Plain,
            token: None,
            raw_text: line.to_string(),
        }
    }

    /// Label used for gutter annotations: the printed token, else the severity
    pub fn label(&self) -> &str {
        self.token.as_deref().unwrap_or(self.severity.as_str())
    }
}

/// Classify a single line of output
pub fn classify(line: &str) -> Diagnostic {
    let Some(sloc) = find_sloc(line) else {
        return Diagnostic::plain(line);
    };

    let severity = match sloc.token {
        Some("info") => Severity::Info,
        _ => Severity::Error,
    };

    Diagnostic {
        location: Some(SourceLocation {
            file: sloc.file.to_string(),
            row: sloc.row,
            column: sloc.column,
        }),
        severity,
        token: sloc.token.map(str::to_string),
        raw_text: line.to_string(),
    }
}

/// Split a free-text message on `\n` / `\r\n` boundaries
pub fn split_lines(data: &str) -> impl Iterator<Item = &str> {
    data.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Classify every line of a stdout/stderr/internal_error message.
///
/// Internal errors get the fixed report suffix appended before splitting;
/// lines of theirs without a source reference keep the internal severity.
pub fn classify_output(data: &str, internal: bool) -> Vec<Diagnostic> {
    let text = if internal {
        format!("{} {}", data, INTERNAL_ERROR_MESSAGE)
    } else {
        data.to_string()
    };

    split_lines(&text)
        .map(|line| {
            let mut diag = classify(line);
            if internal && diag.location.is_none() {
                diag.severity = Severity::InternalError;
            }
            diag
        })
        .collect()
}

struct Sloc<'a> {
    file: &'a str,
    row: u32,
    column: u32,
    token: Option<&'a str>,
}

fn find_sloc(line: &str) -> Option<Sloc<'_>> {
    // The prefix may not cross a line terminator
    let limit = line
        .find(|c: char| matches!(c, '\r' | '\u{2028}' | '\u{2029}'))
        .unwrap_or(line.len());

    // Greedy prefix: the candidate after the last space is tried first
    let after_spaces = line[..limit]
        .match_indices(' ')
        .map(|(i, _)| i + 1)
        .collect::<Vec<_>>();

    after_spaces
        .into_iter()
        .rev()
        .chain(std::iter::once(0))
        .find_map(|start| match_at(&line[start..]))
}

fn is_file_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
}

fn match_at(rest: &str) -> Option<Sloc<'_>> {
    let file_len = rest.bytes().take_while(|b| is_file_byte(*b)).count();
    let file = &rest[..file_len];
    if file.len() < 5 || !(file.ends_with(".adb") || file.ends_with(".ads")) {
        return None;
    }

    let cur = rest[file_len..].strip_prefix(':')?;
    let (row, mut cur) = take_digits(cur)?;
    // Rows are 1-based
    if row == 0 {
        return None;
    }

    let mut column = 0;
    if let Some((col, after)) = cur.strip_prefix(':').and_then(take_digits) {
        column = col;
        cur = after;
    }

    let token = cur.strip_prefix(": ").and_then(take_token);

    Some(Sloc {
        file,
        row,
        column,
        token,
    })
}

fn take_digits(s: &str) -> Option<(u32, &str)> {
    let len = s.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let value = s[..len].parse().unwrap_or(u32::MAX);
    Some((value, &s[len..]))
}

fn take_token(s: &str) -> Option<&str> {
    let run_len = s.find(char::is_whitespace).unwrap_or(s.len());
    let run = &s[..run_len];
    match run.rfind(':') {
        Some(i) if i > 0 => Some(&run[..i]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str, row: u32, column: u32) -> Option<SourceLocation> {
        Some(SourceLocation {
            file: file.to_string(),
            row,
            column,
        })
    }

    #[test]
    fn test_full_sloc_with_error_token() {
        let d = classify("foo.adb:12:5: error: bar");
        assert_eq!(d.location, loc("foo.adb", 12, 5));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.label(), "error");
        assert_eq!(d.raw_text, "foo.adb:12:5: error: bar");
    }

    #[test]
    fn test_row_only_with_warning_token() {
        let d = classify("foo.ads:3: warning: baz");
        assert_eq!(d.location, loc("foo.ads", 3, 0));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.token.as_deref(), Some("warning"));
    }

    #[test]
    fn test_info_token_maps_to_info() {
        let d = classify("main.adb:7:1: info: \"Foo\" is not referenced");
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.label(), "info");
    }

    #[test]
    fn test_no_token_defaults_to_error() {
        let d = classify("main.adb:20: missing \";\"");
        assert_eq!(d.location, loc("main.adb", 20, 0));
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.token, None);
        assert_eq!(d.label(), "error");
    }

    #[test]
    fn test_token_is_case_sensitive_and_verbatim() {
        let d = classify("a.adb:1:2: Info: x");
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.token.as_deref(), Some("Info"));
    }

    #[test]
    fn test_prefix_before_file() {
        let d = classify("gprbuild: main.adb:4:10: error: bad");
        assert_eq!(d.location, loc("main.adb", 4, 10));
    }

    #[test]
    fn test_last_candidate_wins() {
        let d = classify("a.adb:1: instantiated at b.ads:2:3: error: x");
        assert_eq!(d.location, loc("b.ads", 2, 3));
    }

    #[test]
    fn test_file_glued_to_prefix_is_not_a_match() {
        let d = classify("path/foo.adb:1:1: error: x");
        assert_eq!(d.location, None);
        assert_eq!(d.severity, Severity::Plain);
    }

    #[test]
    fn test_non_numeric_row_is_plain() {
        let d = classify("foo.adb:abc: error: x");
        assert_eq!(d.location, None);
        assert_eq!(d.severity, Severity::Plain);
    }

    #[test]
    fn test_row_zero_is_plain() {
        let d = classify("foo.adb:0:3: error: x");
        assert_eq!(d.location, None);
        assert_eq!(d.severity, Severity::Plain);
    }

    #[test]
    fn test_row_zero_falls_back_to_earlier_candidate() {
        let d = classify("a.adb:5:1: see b.ads:0:1: error: x");
        assert_eq!(d.location, loc("a.adb", 5, 1));
    }

    #[test]
    fn test_other_extensions_are_plain() {
        assert_eq!(classify("main.c:3:1: error: x").location, None);
        assert_eq!(classify(".adb:3:1: error: x").location, None);
    }

    #[test]
    fn test_non_matching_lines_are_preserved() {
        for line in ["", "Hello, World!", "  indented  ", "raised CONSTRAINT_ERROR : x"] {
            let d = classify(line);
            assert_eq!(d.location, None);
            assert_eq!(d.severity, Severity::Plain);
            assert_eq!(d.raw_text, line);
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let line = "foo.adb:12:5: warning: unused";
        assert_eq!(classify(line), classify(line));
    }

    #[test]
    fn test_token_runs_to_last_colon() {
        let d = classify("foo.adb:1:2: a:b: rest");
        assert_eq!(d.token.as_deref(), Some("a:b"));
    }

    #[test]
    fn test_token_needs_trailing_colon() {
        let d = classify("foo.adb:1:2: (style) bad indentation");
        assert_eq!(d.token, None);
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn test_column_kept_without_token() {
        // Column and token are independent: a located line without a
        // severity token still jumps to its column.
        let d = classify("foo.adb:1:2: (style) bad indentation");
        assert_eq!(d.location, loc("foo.adb", 1, 2));

        let d = classify("foo.adb:8:14");
        assert_eq!(d.location, loc("foo.adb", 8, 14));
        assert_eq!(d.token, None);
    }

    #[test]
    fn test_split_lines_handles_crlf() {
        let lines: Vec<_> = split_lines("a\r\nb\nc").collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_classify_output_internal_suffix() {
        let diags = classify_output("compiler crashed", true);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::InternalError);
        assert_eq!(
            diags[0].raw_text,
            format!("compiler crashed {}", INTERNAL_ERROR_MESSAGE)
        );
    }

    #[test]
    fn test_classify_output_internal_still_matches_sloc() {
        let diags = classify_output("foo.adb:2:3: error: boom", true);
        assert_eq!(diags[0].location, loc("foo.adb", 2, 3));
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_classify_output_multiline() {
        let diags = classify_output("foo.adb:1:1: error: a\nplain\n", false);
        assert_eq!(diags.len(), 3);
        assert!(diags[0].location.is_some());
        assert_eq!(diags[1].severity, Severity::Plain);
        assert_eq!(diags[2].raw_text, "");
    }
}
