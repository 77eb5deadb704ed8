//! Bootstrap entry points.
//!
//! The hosting process calls [`create_injector`] once at startup and threads
//! the returned [`Injector`] to whatever needs services. There is no global
//! "current injector".

use thiserror::Error;

use crate::ide::IdeModule;
use crate::inject::{build, merge_all, InjectError, Injector, Module};
use crate::language::RuntimeModule;

/// Why startup could not produce an injector. Always fatal.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("module '{module}' failed to provide its bindings: {source}")]
    Collaborator {
        module: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("invalid service configuration: {0}")]
    Configuration(#[from] InjectError),
}

/// An ordered list of modules; each one overrides every module before it.
pub struct IdeSetup {
    modules: Vec<Box<dyn Module>>,
}

impl IdeSetup {
    /// Runtime bindings overridden by IDE bindings.
    pub fn new() -> Self {
        Self::empty().with_module(RuntimeModule).with_module(IdeModule)
    }

    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Appends `module` with higher precedence than every module already added.
    pub fn with_module(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Collects every module's bindings, merges them in order, builds the
    /// injector and checks its dependency graph.
    pub fn create_injector(&self) -> Result<Injector, SetupError> {
        let mut sets = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let set = module
                .bindings()
                .map_err(|source| SetupError::Collaborator {
                    module: module.name().to_string(),
                    source: source.into(),
                })?;
            log::info!(
                "Module '{}' contributed {} binding(s)",
                module.name(),
                set.len()
            );
            sets.push(set);
        }

        let injector = build(merge_all(&sets));
        injector.verify()?;
        log::info!(
            "Injector '{}' ready with {} binding(s)",
            injector.name(),
            injector.len()
        );
        Ok(injector)
    }
}

impl Default for IdeSetup {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime bindings only, for batch tools that never talk to an editor.
pub struct StandaloneSetup;

impl StandaloneSetup {
    pub fn create_injector() -> Result<Injector, SetupError> {
        IdeSetup::empty()
            .with_module(RuntimeModule)
            .create_injector()
    }
}

/// The language-server bootstrap: runtime module as base, IDE module on top.
pub fn create_injector() -> Result<Injector, SetupError> {
    IdeSetup::new().create_injector()
}
