//! Diagnostic mapping utilities for the FSM language server.
//!
//! This module converts parse errors and validation issues into LSP
//! diagnostics that can be displayed in the editor.

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range};

use crate::language::{Issue, ParseError, Severity};
use crate::line_index::LineIndex;

/// Code used for every syntax error.
pub const SYNTAX_ERROR_CODE: &str = "E000";

/// Convert a `ParseError` to an LSP `Diagnostic`.
///
/// Syntax errors carry a precise location; a short range is marked at the
/// error position.
pub fn parse_error_to_diagnostic(error: &ParseError) -> Diagnostic {
    let range = fsm_range_to_lsp_range(error.line, error.column, error.line, error.column + 1);
    error_diagnostic(range, error.message.clone(), SYNTAX_ERROR_CODE.to_string())
}

/// Convert a validation `Issue` to an LSP `Diagnostic`.
pub fn issue_to_diagnostic(issue: &Issue, line_index: &LineIndex) -> Diagnostic {
    let range = line_index.range_of(issue.range);
    match issue.severity {
        Severity::Error => error_diagnostic(range, issue.message.clone(), issue.code.to_string()),
        Severity::Warning => {
            warning_diagnostic(range, issue.message.clone(), issue.code.to_string())
        }
    }
}

/// Convert a parser source range to an LSP range.
///
/// **IMPORTANT**: the parser reports 1-based line/column values, while LSP
/// uses 0-based indexing. This function MUST subtract 1 from both.
pub fn fsm_range_to_lsp_range(
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
) -> Range {
    Range {
        start: Position {
            line: start_line.saturating_sub(1) as u32,
            character: start_col.saturating_sub(1) as u32,
        },
        end: Position {
            line: end_line.saturating_sub(1) as u32,
            character: end_col.saturating_sub(1) as u32,
        },
    }
}

/// Create an error diagnostic at the given range.
pub fn error_diagnostic(range: Range, message: String, code: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::ERROR),
        code: Some(NumberOrString::String(code)),
        source: Some("fsm".to_string()),
        message,
        ..Default::default()
    }
}

/// Create a warning diagnostic at the given range.
pub fn warning_diagnostic(range: Range, message: String, code: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::WARNING),
        code: Some(NumberOrString::String(code)),
        source: Some("fsm".to_string()),
        message,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::ByteRange;

    #[test]
    fn test_range_conversion_1_based_to_0_based() {
        // The parser reports line 1, column 1 (first character in file)
        // LSP expects line 0, character 0
        let range = fsm_range_to_lsp_range(1, 1, 1, 10);
        assert_eq!(range.start.line, 0);
        assert_eq!(range.start.character, 0);
        assert_eq!(range.end.line, 0);
        assert_eq!(range.end.character, 9);
    }

    #[test]
    fn test_parse_error_diagnostic() {
        let error = ParseError {
            message: "expected a name".to_string(),
            line: 3,
            column: 7,
        };
        let diag = parse_error_to_diagnostic(&error);
        assert_eq!(diag.range.start, Position::new(2, 6));
        assert_eq!(
            diag.code,
            Some(NumberOrString::String(SYNTAX_ERROR_CODE.to_string()))
        );
        assert_eq!(diag.message, "expected a name");
    }

    #[test]
    fn test_issue_diagnostic_uses_line_index() {
        let text = "state A\ntransition t from A to Nope";
        let start = text.find("Nope").unwrap();
        let issue = Issue::error("E001", "Undefined state: Nope", ByteRange::new(start, start + 4));
        let diag = issue_to_diagnostic(&issue, &LineIndex::new(text));

        assert_eq!(diag.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(diag.range.start, Position::new(1, 23));
        assert_eq!(diag.range.end, Position::new(1, 27));
        assert_eq!(diag.source, Some("fsm".to_string()));
    }

    #[test]
    fn test_warning_severity() {
        let issue = Issue::warning("W001", "Unreachable state: X", ByteRange::new(0, 1));
        let diag = issue_to_diagnostic(&issue, &LineIndex::new("X"));
        assert_eq!(diag.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diag.code, Some(NumberOrString::String("W001".to_string())));
    }
}
