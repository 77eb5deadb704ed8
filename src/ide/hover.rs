//! Markdown hover for declarations and state references.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::inject::{Dependencies, InjectError, Injectable, ServiceKey};
use crate::language::model::{MachineDecl, StateDecl, TransitionDecl};
use crate::language::{ByteRange, LanguageInfo, Model, SymbolKind};

/// Lists longer than this are cut with a "more" marker.
const MAX_LISTED: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub markdown: String,
    /// Range of the hovered name.
    pub range: ByteRange,
}

pub trait HoverProvider: Send + Sync {
    fn hover(&self, model: &Model, offset: usize) -> Option<HoverInfo>;
}

pub struct DeclarationHover {
    info: Arc<LanguageInfo>,
}

impl DeclarationHover {
    pub fn new(info: Arc<LanguageInfo>) -> Self {
        Self { info }
    }

    fn code_block(&self, line: &str) -> String {
        format!("```{}\n{}\n```\n", self.info.language_id, line)
    }

    fn machine(&self, model: &Model, machine: &MachineDecl) -> String {
        let mut markdown = self.code_block(&format!("machine {}", machine.name.text));
        let _ = write!(
            markdown,
            "\n{} state(s), {} transition(s)",
            model.states.len(),
            model.transitions.len()
        );
        if let Some(initial) = model.initial_states().next() {
            let _ = write!(markdown, ", starts in `{}`", initial.name.text);
        }
        markdown
    }

    fn state(&self, model: &Model, state: &StateDecl) -> String {
        let declaration = if state.initial {
            format!("state {} initial", state.name.text)
        } else {
            format!("state {}", state.name.text)
        };
        let mut markdown = self.code_block(&declaration);

        let incoming: Vec<&str> = model
            .incoming(&state.name.text)
            .map(|t| t.name.text.as_str())
            .collect();
        let outgoing: Vec<&str> = model
            .outgoing(&state.name.text)
            .map(|t| t.name.text.as_str())
            .collect();
        push_list(&mut markdown, "Incoming", &incoming);
        push_list(&mut markdown, "Outgoing", &outgoing);
        markdown
    }

    fn transition(&self, transition: &TransitionDecl) -> String {
        let mut declaration = format!(
            "transition {} from {} to {}",
            transition.name.text, transition.source.text, transition.target.text
        );
        if let Some(guard) = &transition.guard {
            let _ = write!(declaration, " when \"{guard}\"");
        }
        let mut markdown = self.code_block(&declaration);
        let _ = write!(
            markdown,
            "\n`{}` → `{}`",
            transition.source.text, transition.target.text
        );
        markdown
    }
}

fn push_list(markdown: &mut String, label: &str, names: &[&str]) {
    let _ = write!(markdown, "\n**{label}:** ");
    if names.is_empty() {
        markdown.push_str("none");
        return;
    }
    let shown: Vec<String> = names
        .iter()
        .take(MAX_LISTED)
        .map(|name| format!("`{name}`"))
        .collect();
    markdown.push_str(&shown.join(", "));
    if names.len() > MAX_LISTED {
        let _ = write!(markdown, " … and {} more", names.len() - MAX_LISTED);
    }
    markdown.push('\n');
}

impl HoverProvider for DeclarationHover {
    fn hover(&self, model: &Model, offset: usize) -> Option<HoverInfo> {
        let occurrence = model.symbol_at_offset(offset)?;
        let name = &occurrence.name.text;

        let markdown = match occurrence.kind {
            SymbolKind::Machine => self.machine(model, model.machine.as_ref()?),
            SymbolKind::State => match model.state(name) {
                Some(state) => self.state(model, state),
                None => format!("Undefined state `{name}`"),
            },
            SymbolKind::Transition => self.transition(model.transition(name)?),
        };

        Some(HoverInfo {
            markdown,
            range: occurrence.name.range,
        })
    }
}

impl Injectable for DeclarationHover {
    fn dependencies() -> Vec<ServiceKey> {
        vec![ServiceKey::of::<LanguageInfo>()]
    }

    fn construct(dependencies: &Dependencies) -> Result<Self, InjectError> {
        Ok(Self::new(dependencies.get::<LanguageInfo>()?))
    }
}

crate::provides!(DeclarationHover => dyn HoverProvider);
