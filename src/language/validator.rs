use std::collections::HashSet;

use serde::Serialize;

use super::model::{ByteRange, Model};
use crate::inject::{Dependencies, InjectError, Injectable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A semantic problem found in a parsed model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub range: ByteRange,
}

impl Issue {
    pub fn error(code: &'static str, message: impl Into<String>, range: ByteRange) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            range,
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, range: ByteRange) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            range,
        }
    }
}

pub trait Validator: Send + Sync {
    fn validate(&self, model: &Model) -> Vec<Issue>;
}

/// Language rules every tool enforces.
///
/// | Code | Rule |
/// |------|------|
/// | E001 | transition endpoints must name a declared state |
/// | E002 | state names are unique |
/// | E003 | transition names are unique |
/// | E004 | a machine with states has an initial state |
/// | E005 | at most one state is initial |
#[derive(Debug, Default)]
pub struct CoreValidator;

impl Validator for CoreValidator {
    fn validate(&self, model: &Model) -> Vec<Issue> {
        let mut issues = Vec::new();

        let mut states = HashSet::new();
        for state in &model.states {
            if !states.insert(state.name.text.as_str()) {
                issues.push(Issue::error(
                    "E002",
                    format!("Duplicate state: {}", state.name.text),
                    state.name.range,
                ));
            }
        }

        let mut transitions = HashSet::new();
        for transition in &model.transitions {
            if !transitions.insert(transition.name.text.as_str()) {
                issues.push(Issue::error(
                    "E003",
                    format!("Duplicate transition: {}", transition.name.text),
                    transition.name.range,
                ));
            }
            for endpoint in [&transition.source, &transition.target] {
                if !states.contains(endpoint.text.as_str()) {
                    issues.push(Issue::error(
                        "E001",
                        format!("Undefined state: {}", endpoint.text),
                        endpoint.range,
                    ));
                }
            }
        }

        let mut initial = model.initial_states();
        match initial.next() {
            None if !model.states.is_empty() => {
                let range = model
                    .machine
                    .as_ref()
                    .map(|m| m.name.range)
                    .unwrap_or(model.states[0].name.range);
                issues.push(Issue::error("E004", "No initial state declared", range));
            }
            _ => {}
        }
        for extra in initial {
            issues.push(Issue::error(
                "E005",
                format!("Multiple initial states: {}", extra.name.text),
                extra.name.range,
            ));
        }

        issues.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then_with(|| a.code.cmp(b.code))
        });
        issues
    }
}

impl Injectable for CoreValidator {
    fn construct(_: &Dependencies) -> Result<Self, InjectError> {
        Ok(CoreValidator)
    }
}

crate::provides!(CoreValidator => dyn Validator);
