//! Function return shapes.

use std::error::Error;
use std::sync::Arc;

use variadics_please::all_tuples;

use super::param::{Instance, instance};
use crate::error::ConstructorError;
use crate::key::TypeKey;

/// One output slot of a function signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// A value of the given type.
    Value(TypeKey),
    /// A trailing error slot, produced by returning `Result`.
    Error,
}

/// A single value a function can return.
///
/// `Arc<T>` values are keyed by `T`; plain values such as `String` or `u32`
/// are keyed by their own type and wrapped in an `Arc` when erased.
/// Implement this for your own types to return them from
/// [`call`](crate::Injector::call1)-style functions.
pub trait ReturnValue: Sized + 'static {
    /// The key this value is stored under.
    fn key() -> TypeKey;

    /// Erases the value.
    fn into_instance(self) -> Instance;
}

impl<T: ?Sized + Send + Sync + 'static> ReturnValue for Arc<T> {
    fn key() -> TypeKey {
        TypeKey::of::<T>()
    }

    fn into_instance(self) -> Instance {
        instance(self)
    }
}

macro_rules! impl_plain_return_value {
    ($($ty:ty),*) => {
        $(
            impl ReturnValue for $ty {
                fn key() -> TypeKey {
                    TypeKey::of::<$ty>()
                }

                fn into_instance(self) -> Instance {
                    instance(Arc::new(self))
                }
            }
        )*
    };
}

impl_plain_return_value!(
    String,
    &'static str,
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64
);

/// What a constructor produced, once its native return value is erased.
#[doc(hidden)]
pub struct Outcome {
    pub(crate) value: Option<Instance>,
    pub(crate) error: Option<ConstructorError>,
}

/// The complete return shape of a function.
///
/// | Return type | Shape |
/// |-------------|-------|
/// | `()` | no outputs |
/// | any [`ReturnValue`] | one value |
/// | `Result<V, E>` | a value and an error |
/// | `(V1, .., Vn)`, n in 2..=5 | n values |
pub trait Returns: Sized + 'static {
    /// Lists the output slots, in order.
    fn returns() -> Vec<ReturnType>;

    /// Erases the first value and any error.
    #[doc(hidden)]
    fn into_outcome(self) -> Outcome;
}

impl Returns for () {
    fn returns() -> Vec<ReturnType> {
        Vec::new()
    }

    fn into_outcome(self) -> Outcome {
        Outcome {
            value: None,
            error: None,
        }
    }
}

impl<T: ReturnValue> Returns for T {
    fn returns() -> Vec<ReturnType> {
        vec![ReturnType::Value(T::key())]
    }

    fn into_outcome(self) -> Outcome {
        Outcome {
            value: Some(self.into_instance()),
            error: None,
        }
    }
}

impl<T, E> Returns for Result<T, E>
where
    T: ReturnValue,
    E: Into<Box<dyn Error + Send + Sync>> + 'static,
{
    fn returns() -> Vec<ReturnType> {
        vec![ReturnType::Value(T::key()), ReturnType::Error]
    }

    fn into_outcome(self) -> Outcome {
        match self {
            Ok(value) => Outcome {
                value: Some(value.into_instance()),
                error: None,
            },
            Err(error) => {
                let error: Box<dyn Error + Send + Sync> = error.into();
                Outcome {
                    value: None,
                    error: Some(Arc::from(error)),
                }
            }
        }
    }
}

macro_rules! impl_returns_tuple {
    ($($value:ident),*) => {
        impl<$($value: ReturnValue),*> Returns for ($($value,)*) {
            fn returns() -> Vec<ReturnType> {
                vec![$(ReturnType::Value($value::key())),*]
            }

            #[expect(non_snake_case, reason = "tuple bindings reuse the type parameter names")]
            fn into_outcome(self) -> Outcome {
                let ($($value,)*) = self;
                Outcome {
                    value: [$($value.into_instance()),*].into_iter().next(),
                    error: None,
                }
            }
        }
    };
}

// Generate impls for tuples of size 2 to 5
all_tuples!(impl_returns_tuple, 2, 5, R);
