//! Editor side of the language: document synchronization, completion, hover
//! and the stricter editor validator.
//!
//! [`IdeModule`] is meant to be merged over the runtime module; it only binds
//! what differs from or extends the runtime services.

pub mod completion;
pub mod documents;
pub mod hover;
pub mod validator;

pub use completion::{CompletionProvider, KeywordCompletion};
pub use documents::{DocumentState, DocumentStore};
pub use hover::{DeclarationHover, HoverInfo, HoverProvider};
pub use validator::IdeValidator;

use crate::inject::{BindingSet, Module};
use crate::language::Validator;

#[derive(Debug, Default)]
pub struct IdeModule;

impl Module for IdeModule {
    fn name(&self) -> &str {
        "ide"
    }

    fn bindings(&self) -> anyhow::Result<BindingSet> {
        Ok(BindingSet::builder(self.name())
            .singleton::<dyn Validator, IdeValidator>()
            .singleton::<DocumentStore, DocumentStore>()
            .singleton::<dyn CompletionProvider, KeywordCompletion>()
            .singleton::<dyn HoverProvider, DeclarationHover>()
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::{build, InjectError, ServiceKey};

    #[test]
    fn ide_bindings_need_the_runtime_module() {
        let injector = build(IdeModule.bindings().unwrap());
        let err = injector.resolve::<DocumentStore>().err().unwrap();
        assert!(matches!(
            err,
            InjectError::MissingBinding(key) if key == ServiceKey::of::<dyn crate::language::Parser>()
        ));
    }

    #[test]
    fn ide_module_overrides_only_the_validator_from_runtime() {
        let set = IdeModule.bindings().unwrap();
        assert!(set.contains(ServiceKey::of::<dyn Validator>()));
        assert!(!set.contains(ServiceKey::of::<dyn crate::language::Parser>()));
        assert_eq!(set.len(), 4);
    }
}
