//! Service container used to wire the language collaborators together.
//!
//! Each collaborator describes its services as a [`BindingSet`]. Sets are
//! combined with [`merge`] / [`merge_all`], where a later set overrides an
//! earlier one for the same [`ServiceKey`], and the effective set is turned
//! into an [`Injector`] by [`build`].
//!
//! ```text
//! RuntimeModule ──┐
//!                 ├─ merge(base, override) ─ build ─ Injector::resolve::<dyn S>()
//! IdeModule ──────┘
//! ```

mod binding;
mod error;
mod injector;
mod key;
mod merge;
mod module;

pub use binding::{Binding, Injectable, Provides, Scope};
pub use error::InjectError;
pub use injector::{build, Dependencies, Injector};
pub use key::ServiceKey;
pub use merge::{merge, merge_all};
pub use module::{BindingSet, BindingSetBuilder, Module};

/// Declares that a concrete type can be served under one or more trait-object keys.
///
/// ```ignore
/// provides!(CoreValidator => dyn Validator);
/// ```
#[macro_export]
macro_rules! provides {
    ($implementation:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::inject::Provides<$service> for $implementation {
                fn into_service(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}
