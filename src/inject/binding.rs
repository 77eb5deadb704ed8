use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use super::{Dependencies, InjectError, ServiceKey};

/// A constructed service with its concrete type erased.
///
/// The boxed value is always an `Arc<S>` where `S` is the type named by the
/// service key, which lets trait-object services travel through one map.
pub(crate) type Erased = Arc<dyn Any + Send + Sync>;

pub(crate) type Factory =
    Arc<dyn Fn(&Dependencies) -> Result<Erased, InjectError> + Send + Sync>;

/// Lifecycle of a constructed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Constructed on first resolution, then cached for the injector's lifetime.
    Singleton,
    /// Constructed anew on every resolution.
    Transient,
}

#[derive(Clone)]
pub(crate) enum Provider {
    Instance(Erased),
    Factory {
        dependencies: Vec<ServiceKey>,
        scope: Scope,
        factory: Factory,
    },
}

/// A type the injector can construct from its declared dependencies.
pub trait Injectable: Sized + Send + Sync + 'static {
    fn dependencies() -> Vec<ServiceKey> {
        Vec::new()
    }

    fn construct(dependencies: &Dependencies) -> Result<Self, InjectError>;
}

/// Upcast from a concrete implementation to the service type it is bound under.
///
/// Every type provides itself. Trait-object keys are declared with the
/// [`provides!`](crate::provides) macro.
pub trait Provides<S: ?Sized>: Send + Sync + 'static {
    fn into_service(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Provides<T> for T {
    fn into_service(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Maps one [`ServiceKey`] to a construction strategy.
///
/// Bindings are immutable once created; cloning one shares the underlying
/// instance or factory.
#[derive(Clone)]
pub struct Binding {
    key: ServiceKey,
    implementation: &'static str,
    provider: Provider,
}

impl Binding {
    /// Binds `S` to a pre-built instance. Every resolution returns this same pointer.
    pub fn instance<S>(instance: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let erased: Erased = Arc::new(instance);
        Self {
            key: ServiceKey::of::<S>(),
            implementation: type_name::<S>(),
            provider: Provider::Instance(erased),
        }
    }

    /// Binds `S` to a factory closure.
    ///
    /// `dependencies` are resolved before the factory runs and are the only
    /// services the factory may read from its [`Dependencies`].
    pub fn factory<S, F>(scope: Scope, dependencies: Vec<ServiceKey>, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Dependencies) -> Result<Arc<S>, InjectError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |dependencies: &Dependencies| {
            let service = factory(dependencies)?;
            let erased: Erased = Arc::new(service);
            Ok(erased)
        });
        Self {
            key: ServiceKey::of::<S>(),
            implementation: "<factory>",
            provider: Provider::Factory {
                dependencies,
                scope,
                factory,
            },
        }
    }

    /// Binds `S` to the concrete type `T`, constructed through [`Injectable`].
    pub fn to_type<S, T>(scope: Scope) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Injectable + Provides<S>,
    {
        let mut binding = Self::factory::<S, _>(scope, T::dependencies(), |dependencies| {
            let implementation = T::construct(dependencies)?;
            Ok(<T as Provides<S>>::into_service(Arc::new(implementation)))
        });
        binding.implementation = type_name::<T>();
        binding
    }

    pub fn key(&self) -> ServiceKey {
        self.key
    }

    /// Type name of what this binding constructs, or `<factory>` for closures.
    pub fn implementation(&self) -> &'static str {
        self.implementation
    }

    /// Pre-built instances behave like singletons.
    pub fn scope(&self) -> Scope {
        match &self.provider {
            Provider::Instance(_) => Scope::Singleton,
            Provider::Factory { scope, .. } => *scope,
        }
    }

    pub fn dependencies(&self) -> &[ServiceKey] {
        match &self.provider {
            Provider::Instance(_) => &[],
            Provider::Factory { dependencies, .. } => dependencies,
        }
    }

    pub(crate) fn provider(&self) -> &Provider {
        &self.provider
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("implementation", &self.implementation)
            .field("scope", &self.scope())
            .field("dependencies", &self.dependencies())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    impl Injectable for English {
        fn construct(_: &Dependencies) -> Result<Self, InjectError> {
            Ok(English)
        }
    }

    crate::provides!(English => dyn Greeter);

    #[test]
    fn instance_binding_is_singleton_without_dependencies() {
        let binding = Binding::instance::<dyn Greeter>(Arc::new(English));
        assert_eq!(binding.key(), ServiceKey::of::<dyn Greeter>());
        assert_eq!(binding.scope(), Scope::Singleton);
        assert!(binding.dependencies().is_empty());
    }

    #[test]
    fn type_binding_records_implementation_name() {
        let binding = Binding::to_type::<dyn Greeter, English>(Scope::Transient);
        assert_eq!(binding.key(), ServiceKey::of::<dyn Greeter>());
        assert!(binding.implementation().ends_with("English"));
        assert_eq!(binding.scope(), Scope::Transient);
    }

    #[test]
    fn factory_binding_keeps_declared_dependencies() {
        let binding = Binding::factory::<String, _>(
            Scope::Singleton,
            vec![ServiceKey::of::<dyn Greeter>()],
            |deps| Ok(Arc::new(deps.get::<dyn Greeter>()?.greet())),
        );
        assert_eq!(binding.dependencies(), &[ServiceKey::of::<dyn Greeter>()]);
        assert_eq!(binding.implementation(), "<factory>");
    }
}
