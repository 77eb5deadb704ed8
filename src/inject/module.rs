use std::sync::Arc;

use super::{Binding, Dependencies, InjectError, Injectable, Provides, Scope, ServiceKey};

/// An ordered, immutable collection of bindings contributed by one collaborator.
#[derive(Debug, Clone, Default)]
pub struct BindingSet {
    name: String,
    bindings: Vec<Binding>,
}

impl BindingSet {
    pub fn builder(name: impl Into<String>) -> BindingSetBuilder {
        BindingSetBuilder {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    /// An empty set, useful as the seed of a fold.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    pub(crate) fn from_parts(name: String, bindings: Vec<Binding>) -> Self {
        Self { name, bindings }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, key: ServiceKey) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.key() == key)
    }

    pub fn contains(&self, key: ServiceKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = ServiceKey> + '_ {
        self.bindings.iter().map(Binding::key)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Binding> {
        self.bindings.iter()
    }

    pub(crate) fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }
}

impl<'a> IntoIterator for &'a BindingSet {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

/// Collects bindings for a [`BindingSet`].
///
/// Registering the same key twice is an authoring mistake: the later binding
/// replaces the earlier one in place and a warning is logged.
pub struct BindingSetBuilder {
    name: String,
    bindings: Vec<Binding>,
}

impl BindingSetBuilder {
    pub fn bind(mut self, binding: Binding) -> Self {
        let key = binding.key();
        match self.bindings.iter().position(|existing| existing.key() == key) {
            Some(index) => {
                log::warn!(
                    "Binding set '{}' registers {} more than once; keeping {}",
                    self.name,
                    key,
                    binding.implementation()
                );
                self.bindings[index] = binding;
            }
            None => self.bindings.push(binding),
        }
        self
    }

    pub fn instance<S>(self, instance: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.bind(Binding::instance(instance))
    }

    pub fn factory<S, F>(self, scope: Scope, dependencies: Vec<ServiceKey>, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Dependencies) -> Result<Arc<S>, InjectError> + Send + Sync + 'static,
    {
        self.bind(Binding::factory(scope, dependencies, factory))
    }

    /// Binds `S` to `T` with [`Scope::Singleton`].
    pub fn singleton<S, T>(self) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Injectable + Provides<S>,
    {
        self.bind(Binding::to_type::<S, T>(Scope::Singleton))
    }

    /// Binds `S` to `T` with [`Scope::Transient`].
    pub fn transient<S, T>(self) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Injectable + Provides<S>,
    {
        self.bind(Binding::to_type::<S, T>(Scope::Transient))
    }

    pub fn build(self) -> BindingSet {
        BindingSet {
            name: self.name,
            bindings: self.bindings,
        }
    }
}

/// A collaborator that contributes bindings to the injector.
///
/// Obtaining the set may fail (for example when a collaborator cannot load a
/// resource it needs). Such a failure aborts bootstrap.
pub trait Module: Send + Sync {
    fn name(&self) -> &str;

    fn bindings(&self) -> anyhow::Result<BindingSet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_registration_keeps_last_in_place() {
        let set = BindingSet::builder("dupes")
            .instance(Arc::new(1u32))
            .instance(Arc::new("name".to_string()))
            .instance(Arc::new(2u32))
            .build();

        assert_eq!(set.len(), 2);
        let keys: Vec<_> = set.keys().collect();
        assert_eq!(
            keys,
            vec![ServiceKey::of::<u32>(), ServiceKey::of::<String>()]
        );
    }

    #[test]
    fn lookup_by_key() {
        let set = BindingSet::builder("lookup")
            .instance(Arc::new(7u8))
            .build();
        assert!(set.contains(ServiceKey::of::<u8>()));
        assert!(set.get(ServiceKey::of::<u16>()).is_none());
        assert_eq!(set.name(), "lookup");
    }
}
