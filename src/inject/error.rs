use thiserror::Error;

use super::ServiceKey;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures raised while resolving services from an [`Injector`](super::Injector).
///
/// All of these are configuration or programming errors. None of them are
/// retried.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The effective binding set has no entry for the requested service.
    #[error("no binding registered for `{0}`")]
    MissingBinding(ServiceKey),

    /// Resolving the first key of the path required resolving it again.
    #[error("cyclic dependency: {}", display_path(.0))]
    CyclicDependency(Vec<ServiceKey>),

    /// A factory asked for a service it did not list in its dependencies.
    #[error("`{service}` requested `{dependency}` without declaring it as a dependency")]
    UndeclaredDependency {
        service: ServiceKey,
        dependency: ServiceKey,
    },

    /// A constructor or factory reported a failure of its own.
    #[error("failed to construct `{service}`: {source}")]
    Construction {
        service: ServiceKey,
        #[source]
        source: BoxError,
    },

    #[error("binding for `{0}` produced a value of another type")]
    TypeMismatch(ServiceKey),
}

impl InjectError {
    pub fn construction<S: ?Sized + 'static>(source: impl Into<BoxError>) -> Self {
        Self::Construction {
            service: ServiceKey::of::<S>(),
            source: source.into(),
        }
    }

    /// The service the error is about (the start of the path for cycles).
    pub fn service(&self) -> Option<ServiceKey> {
        match self {
            Self::MissingBinding(key) | Self::TypeMismatch(key) => Some(*key),
            Self::CyclicDependency(path) => path.first().copied(),
            Self::UndeclaredDependency { service, .. } | Self::Construction { service, .. } => {
                Some(*service)
            }
        }
    }
}

fn display_path(path: &[ServiceKey]) -> String {
    path.iter()
        .map(ServiceKey::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    struct B;

    #[test]
    fn cycle_message_lists_the_path() {
        let err = InjectError::CyclicDependency(vec![
            ServiceKey::of::<A>(),
            ServiceKey::of::<B>(),
            ServiceKey::of::<A>(),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("cyclic dependency: "));
        assert_eq!(message.matches(" -> ").count(), 2);
        assert_eq!(err.service(), Some(ServiceKey::of::<A>()));
    }

    #[test]
    fn construction_error_keeps_source() {
        let err = InjectError::construction::<A>(anyhow::anyhow!("grammar unavailable"));
        assert!(err.to_string().contains("grammar unavailable"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
