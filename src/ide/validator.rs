use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::inject::{Dependencies, InjectError, Injectable, ServiceKey};
use crate::language::{ByteRange, CoreValidator, Issue, Model, Validator};

/// Editor validation: the core rules plus advisory warnings.
///
/// - W001 state cannot be reached from the initial state
/// - W002 document has no `machine` declaration
pub struct IdeValidator {
    core: Arc<CoreValidator>,
}

impl IdeValidator {
    pub fn new(core: Arc<CoreValidator>) -> Self {
        Self { core }
    }
}

impl Validator for IdeValidator {
    fn validate(&self, model: &Model) -> Vec<Issue> {
        let mut issues = self.core.validate(model);

        if model.machine.is_none() && !model.states.is_empty() {
            issues.push(Issue::warning(
                "W002",
                "Missing machine declaration",
                ByteRange::new(0, 0),
            ));
        }

        let reachable = reachable_states(model);
        if !reachable.is_empty() {
            for state in &model.states {
                if !reachable.contains(state.name.text.as_str()) {
                    issues.push(Issue::warning(
                        "W001",
                        format!("Unreachable state: {}", state.name.text),
                        state.name.range,
                    ));
                }
            }
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

/// States reachable from any initial state. Empty when nothing is initial.
fn reachable_states(model: &Model) -> HashSet<&str> {
    let mut reachable: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = model
        .initial_states()
        .map(|s| s.name.text.as_str())
        .collect();

    while let Some(state) = queue.pop_front() {
        if !reachable.insert(state) {
            continue;
        }
        for transition in model.outgoing(state) {
            queue.push_back(transition.target.text.as_str());
        }
    }
    reachable
}

impl Injectable for IdeValidator {
    fn dependencies() -> Vec<ServiceKey> {
        vec![ServiceKey::of::<CoreValidator>()]
    }

    fn construct(dependencies: &Dependencies) -> Result<Self, InjectError> {
        Ok(Self::new(dependencies.get::<CoreValidator>()?))
    }
}

crate::provides!(IdeValidator => dyn Validator);
