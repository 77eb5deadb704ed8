use std::sync::Arc;

use super::{
    CoreValidator, Formatter, Generator, GrammarParser, JsonGenerator, LanguageInfo,
    LayoutFormatter, Parser, Validator,
};
use crate::inject::{BindingSet, Module, Scope, ServiceKey};

/// Bindings for parsing, validation, formatting and generation.
///
/// `CoreValidator` is bound under its own type as well as behind
/// `dyn Validator`, so a specializing module can replace the validator while
/// still building on the core rules.
#[derive(Debug, Default)]
pub struct RuntimeModule;

impl Module for RuntimeModule {
    fn name(&self) -> &str {
        "runtime"
    }

    fn bindings(&self) -> anyhow::Result<BindingSet> {
        Ok(BindingSet::builder(self.name())
            .instance(Arc::new(LanguageInfo::default()))
            .singleton::<dyn Parser, GrammarParser>()
            .singleton::<CoreValidator, CoreValidator>()
            .factory::<dyn Validator, _>(
                Scope::Singleton,
                vec![ServiceKey::of::<CoreValidator>()],
                |deps| Ok(deps.get::<CoreValidator>()? as Arc<dyn Validator>),
            )
            .singleton::<dyn Formatter, LayoutFormatter>()
            .transient::<dyn Generator, JsonGenerator>()
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::build;

    #[test]
    fn runtime_bindings_resolve_on_their_own() {
        let set = RuntimeModule.bindings().unwrap();
        let injector = build(set);
        injector.verify().expect("runtime module is self-contained");

        let parser = injector.resolve::<dyn Parser>().unwrap();
        let validator = injector.resolve::<dyn Validator>().unwrap();
        let model = parser.parse("state A").unwrap();
        let issues = validator.validate(&model);
        assert_eq!(issues[0].code, "E004");
    }

    #[test]
    fn core_validator_is_shared_between_keys() {
        let injector = build(RuntimeModule.bindings().unwrap());
        let core = injector.resolve::<CoreValidator>().unwrap();
        let as_trait = injector.resolve::<dyn Validator>().unwrap();
        assert!(std::ptr::eq(
            Arc::as_ptr(&core) as *const u8,
            Arc::as_ptr(&as_trait) as *const u8
        ));
    }

    #[test]
    fn generator_is_transient() {
        let injector = build(RuntimeModule.bindings().unwrap());
        let first = injector.resolve::<dyn Generator>().unwrap();
        let second = injector.resolve::<dyn Generator>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
