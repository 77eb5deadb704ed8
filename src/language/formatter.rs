//! Whitespace-only layout for `.fsm` sources.
//!
//! Formatting never changes tokens: runs of blanks collapse to one space,
//! body declarations are indented under `machine`, at most one blank line is
//! kept between blocks, and comments stay where they were.

use std::sync::Arc;

use super::parser::{ParseError, Parser};
use crate::inject::{Dependencies, InjectError, Injectable, ServiceKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_width: usize,
    pub use_tabs: bool,
    /// Indent states and transitions one level under a `machine` line.
    pub indent_body: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            use_tabs: false,
            indent_body: true,
        }
    }
}

impl FormatOptions {
    fn indent(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.indent_width)
        }
    }
}

pub trait Formatter: Send + Sync {
    /// Returns the formatted text, or the parse error for broken input.
    fn format(&self, source: &str, options: &FormatOptions) -> Result<String, ParseError>;
}

pub struct LayoutFormatter {
    parser: Arc<dyn Parser>,
}

impl LayoutFormatter {
    pub fn new(parser: Arc<dyn Parser>) -> Self {
        Self { parser }
    }
}

impl Formatter for LayoutFormatter {
    fn format(&self, source: &str, options: &FormatOptions) -> Result<String, ParseError> {
        let model = self.parser.parse(source)?;
        let indent_body = options.indent_body && model.machine.is_some();
        let indent = options.indent();

        let mut out = String::with_capacity(source.len());
        let mut pending_blank = false;
        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                pending_blank = !out.is_empty();
                continue;
            }
            if pending_blank {
                out.push('\n');
                pending_blank = false;
            }

            let normalized = normalize_spacing(trimmed);
            let is_machine = normalized.split_whitespace().next() == Some("machine");
            if indent_body && !is_machine {
                out.push_str(&indent);
            }
            out.push_str(&normalized);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Injectable for LayoutFormatter {
    fn dependencies() -> Vec<ServiceKey> {
        vec![ServiceKey::of::<dyn Parser>()]
    }

    fn construct(dependencies: &Dependencies) -> Result<Self, InjectError> {
        Ok(Self::new(dependencies.get::<dyn Parser>()?))
    }
}

crate::provides!(LayoutFormatter => dyn Formatter);

/// Collapses blanks outside string literals; the comment tail is kept verbatim.
fn normalize_spacing(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_string = false;
    let mut pending_space = false;
    let mut chars = line.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if in_string {
            out.push(c);
            in_string = c != '"';
            continue;
        }
        if c == '/' && matches!(chars.peek(), Some((_, '/'))) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(line[index..].trim_end());
            return out;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
        in_string = c == '"';
    }
    out
}
