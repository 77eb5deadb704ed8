//! Parsed form of an `.fsm` document.
//!
//! Every name keeps the byte range it was read from so editor features can
//! map positions back to declarations.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// Like [`contains`](Self::contains) but also accepts the end offset, so a
    /// cursor placed right after a name still hits it.
    pub fn touches(&self, offset: usize) -> bool {
        offset >= self.start && offset <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Name {
    pub text: String,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineDecl {
    pub name: Name,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateDecl {
    pub name: Name,
    pub initial: bool,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDecl {
    pub name: Name,
    pub source: Name,
    pub target: Name,
    pub guard: Option<String>,
    pub range: ByteRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Model {
    pub machine: Option<MachineDecl>,
    pub states: Vec<StateDecl>,
    pub transitions: Vec<TransitionDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Machine,
    State,
    Transition,
}

/// One appearance of a name in the document.
#[derive(Debug, Clone, Copy)]
pub struct Occurrence<'a> {
    pub kind: SymbolKind,
    pub name: &'a Name,
    pub is_definition: bool,
}

impl Model {
    /// First declaration of the named state.
    pub fn state(&self, name: &str) -> Option<&StateDecl> {
        self.states.iter().find(|s| s.name.text == name)
    }

    pub fn transition(&self, name: &str) -> Option<&TransitionDecl> {
        self.transitions.iter().find(|t| t.name.text == name)
    }

    pub fn initial_states(&self) -> impl Iterator<Item = &StateDecl> {
        self.states.iter().filter(|s| s.initial)
    }

    pub fn outgoing<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a TransitionDecl> {
        self.transitions.iter().filter(move |t| t.source.text == state)
    }

    pub fn incoming<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a TransitionDecl> {
        self.transitions.iter().filter(move |t| t.target.text == state)
    }

    /// All names in source order.
    pub fn occurrences(&self) -> Vec<Occurrence<'_>> {
        let mut occurrences = Vec::new();
        if let Some(machine) = &self.machine {
            occurrences.push(Occurrence {
                kind: SymbolKind::Machine,
                name: &machine.name,
                is_definition: true,
            });
        }
        for state in &self.states {
            occurrences.push(Occurrence {
                kind: SymbolKind::State,
                name: &state.name,
                is_definition: true,
            });
        }
        for transition in &self.transitions {
            occurrences.push(Occurrence {
                kind: SymbolKind::Transition,
                name: &transition.name,
                is_definition: true,
            });
            for endpoint in [&transition.source, &transition.target] {
                occurrences.push(Occurrence {
                    kind: SymbolKind::State,
                    name: endpoint,
                    is_definition: false,
                });
            }
        }
        occurrences.sort_by_key(|o| o.name.range.start);
        occurrences
    }

    pub fn symbol_at_offset(&self, offset: usize) -> Option<Occurrence<'_>> {
        self.occurrences()
            .into_iter()
            .find(|o| o.name.range.touches(offset))
    }

    pub fn definition(&self, kind: SymbolKind, name: &str) -> Option<&Name> {
        match kind {
            SymbolKind::Machine => self
                .machine
                .as_ref()
                .map(|m| &m.name)
                .filter(|n| n.text == name),
            SymbolKind::State => self.state(name).map(|s| &s.name),
            SymbolKind::Transition => self.transition(name).map(|t| &t.name),
        }
    }

    /// Non-defining uses of a name.
    pub fn references(&self, kind: SymbolKind, name: &str) -> Vec<&Name> {
        self.occurrences()
            .into_iter()
            .filter(|o| o.kind == kind && !o.is_definition && o.name.text == name)
            .map(|o| o.name)
            .collect()
    }
}
