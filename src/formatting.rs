//! Format handler for the FSM language server.
//!
//! Turns the runtime formatter's output into LSP text edits.

use tower_lsp::lsp_types::{FormattingOptions, Position, Range, TextEdit};

use crate::language::{FormatOptions, Formatter};

/// Format a document and return the text edits.
///
/// # Returns
/// A single whole-document edit, or an empty vector when the text is already
/// formatted or does not parse (broken code is never reformatted).
pub fn format_document(
    formatter: &dyn Formatter,
    source: &str,
    options: &FormatOptions,
) -> Vec<TextEdit> {
    match formatter.format(source, options) {
        Ok(formatted) => {
            // If the formatted output is identical, no edits needed
            if formatted == source {
                return vec![];
            }

            // Replace entire document with formatted content
            let lines: Vec<&str> = source.lines().collect();
            let end_line = if lines.is_empty() { 0 } else { lines.len() - 1 };
            let end_char = lines.last().map(|l| l.len()).unwrap_or(0);

            // Handle case where source ends with newline but lines() doesn't include it
            let (final_line, final_char) = if source.ends_with('\n') {
                (lines.len() as u32, 0)
            } else {
                (end_line as u32, end_char as u32)
            };

            vec![TextEdit {
                range: Range {
                    start: Position {
                        line: 0,
                        character: 0,
                    },
                    end: Position {
                        line: final_line,
                        character: final_char,
                    },
                },
                new_text: formatted,
            }]
        }
        Err(e) => {
            // Log the error but return empty edits - don't format broken code
            log::warn!("Format error: {}", e);
            vec![]
        }
    }
}

/// Extract formatting options from an LSP request.
///
/// Indentation comes from the editor; `indent_body` is a server setting the
/// request has no field for.
pub fn extract_format_options(options: &FormattingOptions, indent_body: bool) -> FormatOptions {
    FormatOptions {
        indent_width: options.tab_size as usize,
        use_tabs: !options.insert_spaces,
        indent_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{GrammarParser, LayoutFormatter};
    use std::sync::Arc;

    fn formatter() -> LayoutFormatter {
        LayoutFormatter::new(Arc::new(GrammarParser))
    }

    #[test]
    fn test_format_valid_document_returns_edit() {
        let source = "machine   Door\nstate   Closed    initial";
        let result = format_document(&formatter(), source, &FormatOptions::default());

        assert_eq!(result.len(), 1, "Should return exactly one edit");
        let edit = &result[0];
        assert_eq!(edit.range.start, Position::new(0, 0));
        assert_eq!(edit.range.end, Position::new(1, 25));
        assert_eq!(edit.new_text, "machine Door\n    state Closed initial\n");
    }

    #[test]
    fn test_format_malformed_returns_empty() {
        let result = format_document(&formatter(), "state", &FormatOptions::default());
        assert!(result.is_empty(), "Should return empty edits for malformed code");
    }

    #[test]
    fn test_format_already_formatted_returns_empty() {
        let source = "machine Door\n    state Closed initial\n";
        let result = format_document(&formatter(), source, &FormatOptions::default());
        assert!(result.is_empty());
    }

    #[test]
    fn test_trailing_newline_edit_ends_on_next_line() {
        let source = "state  A initial\n";
        let result = format_document(&formatter(), source, &FormatOptions::default());
        assert_eq!(result[0].range.end, Position::new(1, 0));
    }

    #[test]
    fn test_extract_format_options() {
        let options = FormattingOptions {
            tab_size: 2,
            insert_spaces: true,
            ..Default::default()
        };
        let config = extract_format_options(&options, true);
        assert_eq!(config.indent_width, 2);
        assert!(!config.use_tabs);
        assert!(config.indent_body);

        let options_tabs = FormattingOptions {
            tab_size: 4,
            insert_spaces: false,
            ..Default::default()
        };
        let config_tabs = extract_format_options(&options_tabs, false);
        assert!(config_tabs.use_tabs);
        assert!(!config_tabs.indent_body);
    }
}
