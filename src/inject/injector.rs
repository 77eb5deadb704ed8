use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::binding::{Erased, Provider};
use super::{Binding, BindingSet, InjectError, Scope, ServiceKey};

/// The already-resolved dependencies handed to a factory.
///
/// Only keys declared by the binding are present; asking for anything else
/// fails with [`InjectError::UndeclaredDependency`].
pub struct Dependencies {
    requester: ServiceKey,
    resolved: HashMap<ServiceKey, Erased>,
}

impl Dependencies {
    pub fn get<S>(&self) -> Result<Arc<S>, InjectError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<S>();
        let erased = self
            .resolved
            .get(&key)
            .ok_or(InjectError::UndeclaredDependency {
                service: self.requester,
                dependency: key,
            })?;
        downcast::<S>(key, erased)
    }
}

fn downcast<S>(key: ServiceKey, erased: &Erased) -> Result<Arc<S>, InjectError>
where
    S: ?Sized + Send + Sync + 'static,
{
    erased
        .downcast_ref::<Arc<S>>()
        .cloned()
        .ok_or(InjectError::TypeMismatch(key))
}

struct Slot {
    binding: Binding,
    // Per-key guard: held only while the factory runs, never across recursion.
    instance: Mutex<Option<Erased>>,
}

struct Inner {
    name: String,
    slots: HashMap<ServiceKey, Slot>,
    constructed: Mutex<Vec<ServiceKey>>,
}

/// Resolves service keys to constructed instances.
///
/// An `Injector` is cheap to clone and safe to share between threads; the
/// bootstrap returns it by value and callers pass it to whatever needs it.
#[derive(Clone)]
pub struct Injector {
    inner: Arc<Inner>,
}

/// Builds an injector over an effective binding set.
///
/// Nothing is constructed here; services are created on first resolution.
pub fn build(effective: BindingSet) -> Injector {
    let name = effective.name().to_string();
    let slots: HashMap<ServiceKey, Slot> = effective
        .into_bindings()
        .into_iter()
        .map(|binding| {
            (
                binding.key(),
                Slot {
                    binding,
                    instance: Mutex::new(None),
                },
            )
        })
        .collect();
    log::debug!("Built injector '{}' with {} binding(s)", name, slots.len());

    Injector {
        inner: Arc::new(Inner {
            name,
            slots,
            constructed: Mutex::new(Vec::new()),
        }),
    }
}

impl Injector {
    /// Resolves `S`, constructing it (and its dependencies) if needed.
    pub fn resolve<S>(&self) -> Result<Arc<S>, InjectError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let key = ServiceKey::of::<S>();
        let erased = self.resolve_key(key, &mut Vec::new())?;
        downcast::<S>(key, &erased)
    }

    pub fn contains(&self, key: ServiceKey) -> bool {
        self.inner.slots.contains_key(&key)
    }

    pub fn binding(&self, key: ServiceKey) -> Option<&Binding> {
        self.inner.slots.get(&key).map(|slot| &slot.binding)
    }

    pub fn len(&self) -> usize {
        self.inner.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    fn resolve_key(
        &self,
        key: ServiceKey,
        in_progress: &mut Vec<ServiceKey>,
    ) -> Result<Erased, InjectError> {
        let slot = self
            .inner
            .slots
            .get(&key)
            .ok_or(InjectError::MissingBinding(key))?;

        let (dependencies, scope, factory) = match slot.binding.provider() {
            Provider::Instance(instance) => return Ok(instance.clone()),
            Provider::Factory {
                dependencies,
                scope,
                factory,
            } => (dependencies, *scope, factory),
        };

        if scope == Scope::Singleton {
            if let Some(cached) = slot.instance.lock().as_ref() {
                return Ok(cached.clone());
            }
        }

        if in_progress.contains(&key) {
            let mut path = in_progress.clone();
            path.push(key);
            return Err(InjectError::CyclicDependency(path));
        }

        in_progress.push(key);
        let resolved = dependencies
            .iter()
            .map(|dependency| {
                self.resolve_key(*dependency, in_progress)
                    .map(|instance| (*dependency, instance))
            })
            .collect::<Result<HashMap<_, _>, _>>();
        in_progress.pop();

        let dependencies = Dependencies {
            requester: key,
            resolved: resolved?,
        };

        match scope {
            Scope::Transient => factory(&dependencies),
            Scope::Singleton => {
                let mut guard = slot.instance.lock();
                // Another thread may have finished while dependencies resolved.
                if let Some(cached) = guard.as_ref() {
                    return Ok(cached.clone());
                }
                let instance = factory(&dependencies)?;
                *guard = Some(instance.clone());
                drop(guard);

                self.inner.constructed.lock().push(key);
                log::debug!(
                    "Constructed singleton {} ({})",
                    key,
                    slot.binding.implementation()
                );
                Ok(instance)
            }
        }
    }

    /// Checks the declared dependency graph without constructing anything.
    ///
    /// Reports the first missing binding or cycle, visiting keys in name
    /// order so the result is stable.
    pub fn verify(&self) -> Result<(), InjectError> {
        let mut keys: Vec<ServiceKey> = self.inner.slots.keys().copied().collect();
        keys.sort_by_key(|key| key.name());

        let mut verified = HashSet::new();
        for key in keys {
            self.verify_key(key, &mut Vec::new(), &mut verified)?;
        }
        Ok(())
    }

    fn verify_key(
        &self,
        key: ServiceKey,
        in_progress: &mut Vec<ServiceKey>,
        verified: &mut HashSet<ServiceKey>,
    ) -> Result<(), InjectError> {
        if verified.contains(&key) {
            return Ok(());
        }
        if in_progress.contains(&key) {
            let mut path = in_progress.clone();
            path.push(key);
            return Err(InjectError::CyclicDependency(path));
        }
        let slot = self
            .inner
            .slots
            .get(&key)
            .ok_or(InjectError::MissingBinding(key))?;

        in_progress.push(key);
        for dependency in slot.binding.dependencies() {
            self.verify_key(*dependency, in_progress, verified)?;
        }
        in_progress.pop();
        verified.insert(key);
        Ok(())
    }

    /// Releases cached singletons in reverse construction order.
    ///
    /// Instances still referenced elsewhere stay alive until those references
    /// drop. A later resolution constructs a fresh singleton.
    pub fn shutdown(&self) {
        let order = std::mem::take(&mut *self.inner.constructed.lock());
        for key in order.into_iter().rev() {
            let Some(slot) = self.inner.slots.get(&key) else {
                continue;
            };
            if slot.instance.lock().take().is_some() {
                log::debug!("Released singleton {}", key);
            }
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.inner.name)
            .field("bindings", &self.inner.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Config {
        level: u8,
    }

    struct Service {
        config: Arc<Config>,
    }

    fn config_and_service(scope: Scope) -> BindingSet {
        BindingSet::builder("test")
            .instance(Arc::new(Config { level: 3 }))
            .factory::<Service, _>(scope, vec![ServiceKey::of::<Config>()], |deps| {
                Ok(Arc::new(Service {
                    config: deps.get::<Config>()?,
                }))
            })
            .build()
    }

    #[test]
    fn resolves_dependencies_before_construction() {
        let injector = build(config_and_service(Scope::Transient));
        let service = injector.resolve::<Service>().unwrap();
        assert_eq!(service.config.level, 3);
    }

    #[test]
    fn instance_binding_returns_same_pointer() {
        let config = Arc::new(Config { level: 1 });
        let injector = build(
            BindingSet::builder("instance")
                .instance(config.clone())
                .build(),
        );
        assert!(Arc::ptr_eq(&config, &injector.resolve::<Config>().unwrap()));
    }

    #[test]
    fn undeclared_dependency_is_rejected() {
        let injector = build(
            BindingSet::builder("sneaky")
                .instance(Arc::new(Config { level: 0 }))
                .factory::<Service, _>(Scope::Singleton, vec![], |deps| {
                    Ok(Arc::new(Service {
                        config: deps.get::<Config>()?,
                    }))
                })
                .build(),
        );
        let err = injector.resolve::<Service>().err().unwrap();
        assert!(matches!(
            err,
            InjectError::UndeclaredDependency { service, dependency }
                if service == ServiceKey::of::<Service>() && dependency == ServiceKey::of::<Config>()
        ));
    }

    #[test]
    fn failed_singleton_construction_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let injector = build(
            BindingSet::builder("flaky")
                .factory::<Config, _>(Scope::Singleton, vec![], move |_| {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(InjectError::construction::<Config>("first attempt fails"))
                    } else {
                        Ok(Arc::new(Config { level: 9 }))
                    }
                })
                .build(),
        );

        assert!(matches!(
            injector.resolve::<Config>(),
            Err(InjectError::Construction { .. })
        ));
        assert_eq!(injector.resolve::<Config>().unwrap().level, 9);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn verify_reports_missing_dependency() {
        let injector = build(
            BindingSet::builder("incomplete")
                .factory::<Service, _>(
                    Scope::Singleton,
                    vec![ServiceKey::of::<Config>()],
                    |deps| {
                        Ok(Arc::new(Service {
                            config: deps.get::<Config>()?,
                        }))
                    },
                )
                .build(),
        );
        let err = injector.verify().unwrap_err();
        assert!(matches!(err, InjectError::MissingBinding(key) if key == ServiceKey::of::<Config>()));
    }

    #[test]
    fn shutdown_releases_singletons() {
        let injector = build(config_and_service(Scope::Singleton));
        let first = injector.resolve::<Service>().unwrap();
        injector.shutdown();
        let second = injector.resolve::<Service>().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn debug_output_names_the_injector() {
        let injector = build(config_and_service(Scope::Singleton));
        let rendered = format!("{injector:?}");
        assert!(rendered.contains("test"));
        assert_eq!(injector.len(), 2);
        assert_eq!(injector.name(), "test");
    }
}
