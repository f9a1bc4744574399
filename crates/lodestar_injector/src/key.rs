//! Type identity for registration and lookup.

use core::any::TypeId;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Unique identifier for a registerable type.
///
/// Wraps the type's [`TypeId`] together with its name for diagnostics.
/// Equality and hashing only consider the `TypeId`, so two keys are equal
/// iff they denote the same type.
///
/// Keys may denote sized types (`Config`), trait objects (`dyn Logger`) or
/// pointers (`Box<Config>`):
///
/// ```
/// use lodestar_injector::key::{TypeKey, TypeKind};
///
/// trait Logger: Send + Sync {}
/// struct Config;
///
/// assert_eq!(TypeKey::of::<Config>().kind(), TypeKind::Struct);
/// assert_eq!(TypeKey::of::<dyn Logger>().kind(), TypeKind::Interface);
/// assert_eq!(TypeKey::of::<u32>().kind(), TypeKind::Other);
/// assert_eq!(TypeKey::of::<dyn Logger>().short_name(), "Logger");
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Creates the key for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the last path segment of the type name, without pointer
    /// wrappers, `dyn` markers, auto-trait bounds or generic arguments.
    ///
    /// This is the name indexed for [`Injector::get_by_name`](crate::Injector::get_by_name).
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        short_name(self.name)
    }

    /// Classifies the type denoted by this key.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        TypeKind::classify(self.name)
    }

    /// Returns `true` if the key can be registered: a struct, an interface,
    /// or a pointer to either.
    #[must_use]
    pub fn is_registerable(&self) -> bool {
        match self.kind() {
            TypeKind::Struct | TypeKind::Interface => true,
            TypeKind::Pointer => pointee(self.name)
                .map(TypeKind::classify)
                .is_some_and(|kind| matches!(kind, TypeKind::Struct | TypeKind::Interface)),
            TypeKind::Other => false,
        }
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Broad classification of a type, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A named struct or enum.
    Struct,
    /// A trait object (`dyn Trait`).
    Interface,
    /// A smart pointer, reference or raw pointer.
    Pointer,
    /// Primitives, tuples, arrays, slices and function pointers.
    Other,
}

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64",
    "u128", "usize", "f32", "f64", "!",
];

const POINTER_PREFIXES: &[&str] = &["alloc::boxed::Box<", "alloc::sync::Arc<", "alloc::rc::Rc<"];

impl TypeKind {
    /// Classifies a type from its [`core::any::type_name`].
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let name = name.trim();
        if name.starts_with("dyn ") {
            Self::Interface
        } else if name.starts_with('&')
            || name.starts_with("*const ")
            || name.starts_with("*mut ")
            || POINTER_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
        {
            Self::Pointer
        } else if name.starts_with('(')
            || name.starts_with('[')
            || name.starts_with("fn(")
            || name.starts_with("unsafe ")
            || name.starts_with("extern ")
            || PRIMITIVES.contains(&name)
        {
            Self::Other
        } else {
            Self::Struct
        }
    }
}

/// Returns the name of the type a pointer name points at.
fn pointee(name: &str) -> Option<&str> {
    let name = name.trim();
    if let Some(rest) = name.strip_prefix('&') {
        let rest = rest.strip_prefix("mut ").unwrap_or(rest);
        // Skip an explicit lifetime such as `&'static T`.
        let rest = match rest.strip_prefix('\'') {
            Some(lifetime) => lifetime.split_once(' ').map_or(lifetime, |(_, tail)| tail),
            None => rest,
        };
        return Some(rest);
    }
    if let Some(rest) = name
        .strip_prefix("*const ")
        .or_else(|| name.strip_prefix("*mut "))
    {
        return Some(rest);
    }
    POINTER_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .and_then(|rest| rest.strip_suffix('>'))
}

fn short_name(name: &'static str) -> &'static str {
    let mut name = name.trim();
    while let Some(inner) = pointee(name) {
        name = inner.trim();
    }

    let name = name.strip_prefix("dyn ").unwrap_or(name);
    let name = name.split(" + ").next().unwrap_or(name);
    let name = name.split('<').next().unwrap_or(name);
    name.rsplit("::").next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Service: Send + Sync {}
    struct Config;
    struct Wrapper<T>(T);
    enum Mode {}

    #[test]
    fn equality_is_type_identity() {
        assert_eq!(TypeKey::of::<Config>(), TypeKey::of::<Config>());
        assert_ne!(TypeKey::of::<Config>(), TypeKey::of::<Box<Config>>());
        assert_ne!(TypeKey::of::<dyn Service>(), TypeKey::of::<Config>());
    }

    #[test]
    fn classify_kinds() {
        assert_eq!(TypeKey::of::<Config>().kind(), TypeKind::Struct);
        assert_eq!(TypeKey::of::<Mode>().kind(), TypeKind::Struct);
        assert_eq!(TypeKey::of::<Wrapper<u8>>().kind(), TypeKind::Struct);
        assert_eq!(TypeKey::of::<dyn Service>().kind(), TypeKind::Interface);
        assert_eq!(TypeKey::of::<Box<Config>>().kind(), TypeKind::Pointer);
        assert_eq!(TypeKey::of::<Arc<dyn Service>>().kind(), TypeKind::Pointer);
        assert_eq!(TypeKey::of::<&'static Config>().kind(), TypeKind::Pointer);
        assert_eq!(TypeKey::of::<i32>().kind(), TypeKind::Other);
        assert_eq!(TypeKey::of::<(Config, Config)>().kind(), TypeKind::Other);
        assert_eq!(TypeKey::of::<[u8; 4]>().kind(), TypeKind::Other);
        assert_eq!(TypeKey::of::<fn() -> u8>().kind(), TypeKind::Other);
    }

    #[test]
    fn registerable_keys() {
        assert!(TypeKey::of::<Config>().is_registerable());
        assert!(TypeKey::of::<dyn Service>().is_registerable());
        assert!(TypeKey::of::<Box<Config>>().is_registerable());
        assert!(TypeKey::of::<Arc<dyn Service>>().is_registerable());
        assert!(!TypeKey::of::<u64>().is_registerable());
        assert!(!TypeKey::of::<Box<u64>>().is_registerable());
        assert!(!TypeKey::of::<&'static str>().is_registerable());
    }

    #[test]
    fn short_names() {
        assert_eq!(TypeKey::of::<Config>().short_name(), "Config");
        assert_eq!(TypeKey::of::<dyn Service>().short_name(), "Service");
        assert_eq!(TypeKey::of::<Box<Config>>().short_name(), "Config");
        assert_eq!(TypeKey::of::<Arc<dyn Service>>().short_name(), "Service");
        assert_eq!(TypeKey::of::<Wrapper<Config>>().short_name(), "Wrapper");
        assert_eq!(
            TypeKey::of::<dyn Service + Send + Sync>().short_name(),
            "Service"
        );
    }
}
