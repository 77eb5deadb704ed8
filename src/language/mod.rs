//! Runtime side of the language: everything a batch tool needs to read,
//! check, lay out and generate `.fsm` documents, independent of any editor.

pub mod formatter;
pub mod generator;
pub mod model;
mod module;
pub mod parser;
pub mod validator;

use serde::Serialize;

pub use formatter::{FormatOptions, Formatter, LayoutFormatter};
pub use generator::{Generator, JsonGenerator};
pub use model::{ByteRange, Model, SymbolKind};
pub use module::RuntimeModule;
pub use parser::{GrammarParser, ParseError, Parser};
pub use validator::{CoreValidator, Issue, Severity, Validator};

/// Static facts about the language, bound as a pre-built instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub name: &'static str,
    pub language_id: &'static str,
    pub file_extension: &'static str,
    pub version: &'static str,
}

impl Default for LanguageInfo {
    fn default() -> Self {
        Self {
            name: "FSM",
            language_id: "fsm",
            file_extension: "fsm",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
