//! JSON rendering of a model, the notation's code-generation target.

use std::sync::Arc;

use serde::Serialize;

use super::model::Model;
use super::LanguageInfo;
use crate::inject::{Dependencies, InjectError, Injectable, ServiceKey};

pub trait Generator: Send + Sync {
    fn generate(&self, model: &Model, pretty: bool) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct GeneratedMachine<'a> {
    language: &'a str,
    version: &'a str,
    machine: Option<&'a str>,
    initial: Option<&'a str>,
    states: Vec<GeneratedState<'a>>,
    transitions: Vec<GeneratedTransition<'a>>,
}

#[derive(Debug, Serialize)]
struct GeneratedState<'a> {
    name: &'a str,
    initial: bool,
    outgoing: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct GeneratedTransition<'a> {
    name: &'a str,
    from: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    guard: Option<&'a str>,
}

pub struct JsonGenerator {
    info: Arc<LanguageInfo>,
}

impl JsonGenerator {
    pub fn new(info: Arc<LanguageInfo>) -> Self {
        Self { info }
    }
}

impl Generator for JsonGenerator {
    fn generate(&self, model: &Model, pretty: bool) -> anyhow::Result<String> {
        let document = GeneratedMachine {
            language: self.info.language_id,
            version: self.info.version,
            machine: model.machine.as_ref().map(|m| m.name.text.as_str()),
            initial: model.initial_states().next().map(|s| s.name.text.as_str()),
            states: model
                .states
                .iter()
                .map(|state| GeneratedState {
                    name: &state.name.text,
                    initial: state.initial,
                    outgoing: model
                        .outgoing(&state.name.text)
                        .map(|t| t.name.text.as_str())
                        .collect(),
                })
                .collect(),
            transitions: model
                .transitions
                .iter()
                .map(|t| GeneratedTransition {
                    name: &t.name.text,
                    from: &t.source.text,
                    to: &t.target.text,
                    guard: t.guard.as_deref(),
                })
                .collect(),
        };

        let json = if pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(json)
    }
}

impl Injectable for JsonGenerator {
    fn dependencies() -> Vec<ServiceKey> {
        vec![ServiceKey::of::<LanguageInfo>()]
    }

    fn construct(dependencies: &Dependencies) -> Result<Self, InjectError> {
        Ok(Self::new(dependencies.get::<LanguageInfo>()?))
    }
}

crate::provides!(JsonGenerator => dyn Generator);
