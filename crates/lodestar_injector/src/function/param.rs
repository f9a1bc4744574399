//! Constructor parameters.

use core::any::Any;
use std::sync::Arc;

use crate::key::TypeKey;

/// A resolved, type-erased value.
///
/// The payload is always the `Arc<K>` for the key `K` the value was resolved
/// under, so downcasting to `Arc<K>` recovers a shared handle.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Erases a shared value into an [`Instance`].
#[must_use]
pub fn instance<K: ?Sized + Send + Sync + 'static>(value: Arc<K>) -> Instance {
    Arc::new(value)
}

/// Recovers the shared value stored in an [`Instance`].
#[must_use]
pub fn downcast<K: ?Sized + Send + Sync + 'static>(instance: &Instance) -> Option<Arc<K>> {
    instance.downcast_ref::<Arc<K>>().cloned()
}

/// Describes one parameter of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    /// The key the parameter is resolved under.
    pub key: TypeKey,
    /// Whether the parameter collects a variable number of values.
    pub variadic: bool,
}

impl ParamInfo {
    /// A parameter resolved as a single value of type `K`.
    #[must_use]
    pub fn single<K: ?Sized + 'static>() -> Self {
        Self {
            key: TypeKey::of::<K>(),
            variadic: false,
        }
    }
}

/// A function parameter the injector knows how to supply.
///
/// Implemented for `Arc<T>` (resolved under the key `T`) and for
/// [`Variadic<T>`], which marks a signature as variadic and is always
/// rejected by validation.
pub trait Dependency: Sized + Send + 'static {
    /// Describes this parameter.
    fn param() -> ParamInfo;

    /// Extracts the parameter from a resolved instance.
    fn from_instance(instance: &Instance) -> Option<Self>;
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Arc<T> {
    fn param() -> ParamInfo {
        ParamInfo::single::<T>()
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        downcast::<T>(instance)
    }
}

/// A trailing parameter that accepts any number of `T` values.
///
/// Functions taking a `Variadic` parameter can be described but never
/// registered or called; validation reports
/// [`VariadicArguments`](crate::InjectorError::VariadicArguments).
pub struct Variadic<T: ?Sized>(pub Vec<Arc<T>>);

impl<T: ?Sized + Send + Sync + 'static> Dependency for Variadic<T> {
    fn param() -> ParamInfo {
        ParamInfo {
            key: TypeKey::of::<T>(),
            variadic: true,
        }
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        downcast::<T>(instance).map(|value| Self(vec![value]))
    }
}
