use std::any::{type_name, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of an injectable service.
///
/// Keys are derived from the declared type (usually a trait object such as
/// `dyn Validator`), so two collaborators can only collide on a service when
/// they name the same type. The type name is carried for error messages and
/// logs; equality and hashing use the `TypeId` alone.
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceKey({})", self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Marker {}
    struct Concrete;

    #[test]
    fn keys_compare_by_type() {
        assert_eq!(ServiceKey::of::<dyn Marker>(), ServiceKey::of::<dyn Marker>());
        assert_ne!(ServiceKey::of::<dyn Marker>(), ServiceKey::of::<Concrete>());
    }

    #[test]
    fn display_uses_type_name() {
        let key = ServiceKey::of::<Concrete>();
        assert!(key.to_string().ends_with("Concrete"));
        assert!(format!("{key:?}").starts_with("ServiceKey("));
    }
}
