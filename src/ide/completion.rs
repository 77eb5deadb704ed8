use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use crate::inject::{Dependencies, InjectError, Injectable};
use crate::language::Model;

/// Suggests what can be typed at a byte offset.
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, source: &str, offset: usize, model: Option<&Model>) -> Vec<CompletionItem>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionContext {
    /// Start of a declaration.
    Declaration,
    /// After `from` / `to`.
    StateName,
    /// After `state <name>`.
    StateFlag,
    /// After `transition <name>`, `... from <state>`, `... to <state>`.
    TransitionKeyword(&'static str),
    /// A fresh name is being typed; nothing to suggest.
    NewName,
}

const DECLARATION_KEYWORDS: [&str; 3] = ["machine", "state", "transition"];

/// Keyword- and state-aware completion for the notation.
#[derive(Debug, Default)]
pub struct KeywordCompletion;

impl CompletionProvider for KeywordCompletion {
    fn complete(&self, source: &str, offset: usize, model: Option<&Model>) -> Vec<CompletionItem> {
        let Some(ctx) = detect_context(source, offset) else {
            return Vec::new();
        };

        let mut items = Vec::new();
        match ctx {
            CompletionContext::Declaration => {
                for keyword in DECLARATION_KEYWORDS {
                    if keyword == "machine" && model.is_some_and(|m| m.machine.is_some()) {
                        continue;
                    }
                    items.push(keyword_item(keyword));
                }
            }
            CompletionContext::StateName => {
                if let Some(model) = model {
                    for state in &model.states {
                        items.push(CompletionItem {
                            label: state.name.text.clone(),
                            kind: Some(CompletionItemKind::ENUM_MEMBER),
                            detail: Some(if state.initial {
                                "State (initial)".to_string()
                            } else {
                                "State".to_string()
                            }),
                            ..Default::default()
                        });
                    }
                }
            }
            CompletionContext::StateFlag => items.push(keyword_item("initial")),
            CompletionContext::TransitionKeyword(keyword) => items.push(keyword_item(keyword)),
            CompletionContext::NewName => {}
        }

        items.sort_by(|a, b| {
            kind_rank(a.kind)
                .cmp(&kind_rank(b.kind))
                .then_with(|| a.label.cmp(&b.label))
        });
        items.dedup_by(|a, b| a.label == b.label && a.kind == b.kind);
        items
    }
}

impl Injectable for KeywordCompletion {
    fn construct(_: &Dependencies) -> Result<Self, InjectError> {
        Ok(KeywordCompletion)
    }
}

crate::provides!(KeywordCompletion => dyn CompletionProvider);

fn keyword_item(keyword: &str) -> CompletionItem {
    CompletionItem {
        label: keyword.to_string(),
        kind: Some(CompletionItemKind::KEYWORD),
        detail: Some("Keyword".to_string()),
        ..Default::default()
    }
}

fn kind_rank(kind: Option<CompletionItemKind>) -> u8 {
    match kind {
        Some(k) if k == CompletionItemKind::ENUM_MEMBER => 0,
        Some(k) if k == CompletionItemKind::KEYWORD => 1,
        _ => 9,
    }
}

fn detect_context(source: &str, offset: usize) -> Option<CompletionContext> {
    let offset = offset.min(source.len());
    let before = source.get(..offset)?;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let prefix = &before[line_start..];
    if prefix.contains("//") {
        return None;
    }

    let mut tokens: Vec<&str> = prefix.split_whitespace().collect();
    let typing_word = !prefix.is_empty() && !prefix.ends_with(char::is_whitespace);
    if typing_word {
        tokens.pop();
    }

    let ctx = match tokens.as_slice() {
        [] => CompletionContext::Declaration,
        [.., "from" | "to"] => CompletionContext::StateName,
        ["state", _] => CompletionContext::StateFlag,
        ["transition", _] => CompletionContext::TransitionKeyword("from"),
        ["transition", _, "from", _] => CompletionContext::TransitionKeyword("to"),
        ["transition", _, "from", _, "to", _] => CompletionContext::TransitionKeyword("when"),
        ["machine" | "state" | "transition"] => CompletionContext::NewName,
        // A finished declaration; the next token starts another one.
        ["machine", _] | ["state", _, "initial"] => CompletionContext::Declaration,
        _ => return None,
    };
    Some(ctx)
}
