//! Function descriptors.
//!
//! The injector needs to inspect a constructor before it can register or call
//! it: whether the value is a function at all, which keys its parameters
//! resolve to, what it returns, and whether it is variadic. [`IntoFunction`]
//! extracts that description from ordinary Rust closures and function items
//! at compile time and pairs it with a type-erased way to invoke them.
//!
//! # Supported shapes
//!
//! - Functions and closures taking up to 8 parameters, each a [`Dependency`]
//!   (`Arc<T>` or [`Variadic<T>`]), and returning any [`Returns`] type.
//! - `Arc<T>` values, described as "not a function" so that validation can
//!   reject them with a precise error instead of a compile failure.
//!
//! ```
//! use std::sync::Arc;
//! use lodestar_injector::function::IntoFunction;
//! use lodestar_injector::key::TypeKey;
//!
//! struct Config;
//! struct Server;
//!
//! let function = (|_config: Arc<Config>| Arc::new(Server)).into_function();
//! let signature = function.signature();
//!
//! assert!(signature.is_function());
//! assert_eq!(signature.params()[0].key, TypeKey::of::<Config>());
//! assert!(!signature.is_variadic());
//! ```

mod param;
mod returns;

use core::fmt;
use core::slice;
use std::sync::Arc;

use variadics_please::all_tuples;

pub use param::{Dependency, Instance, ParamInfo, Variadic, downcast, instance};
pub(crate) use returns::Outcome;
pub use returns::{ReturnType, ReturnValue, Returns};

use crate::error::InjectorError;
use crate::key::TypeKey;

/// The statically known shape of a function value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    name: &'static str,
    is_function: bool,
    params: Vec<ParamInfo>,
    returns: Vec<ReturnType>,
}

impl Signature {
    pub(crate) fn function(
        name: &'static str,
        params: Vec<ParamInfo>,
        returns: Vec<ReturnType>,
    ) -> Self {
        Self {
            name,
            is_function: true,
            params,
            returns,
        }
    }

    pub(crate) fn value(name: &'static str) -> Self {
        Self {
            name,
            is_function: false,
            params: Vec::new(),
            returns: Vec::new(),
        }
    }

    /// Returns the type name of the described value.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the value can be invoked.
    #[must_use]
    pub fn is_function(&self) -> bool {
        self.is_function
    }

    /// Returns the parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Returns the parameter keys, in declaration order.
    pub fn param_keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.params.iter().map(|param| param.key)
    }

    /// Returns the output slots, in declaration order.
    #[must_use]
    pub fn returns(&self) -> &[ReturnType] {
        &self.returns
    }

    /// Returns `true` if any parameter is [`Variadic`].
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.params.iter().any(|param| param.variadic)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_function {
            return f.write_str(self.name);
        }

        f.write_str("fn(")?;
        for (index, param) in self.params.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            if param.variadic {
                f.write_str("...")?;
            }
            f.write_str(param.key.short_name())?;
        }
        f.write_str(")")?;

        let label = |slot: &ReturnType| match slot {
            ReturnType::Value(key) => key.short_name(),
            ReturnType::Error => "error",
        };
        match self.returns.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {}", label(single)),
            many => {
                let labels: Vec<&str> = many.iter().map(label).collect();
                write!(f, " -> ({})", labels.join(", "))
            }
        }
    }
}

type Body<R> = Box<dyn Fn(Vec<Instance>) -> Result<R, InjectorError> + Send + Sync>;

/// A described function, ready to be invoked with resolved arguments.
pub struct FunctionValue<R> {
    signature: Signature,
    body: Option<Body<R>>,
}

impl<R> FunctionValue<R> {
    fn new(
        signature: Signature,
        body: impl Fn(Vec<Instance>) -> Result<R, InjectorError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            signature,
            body: Some(Box::new(body)),
        }
    }

    fn not_a_function(name: &'static str) -> Self {
        Self {
            signature: Signature::value(name),
            body: None,
        }
    }

    /// Returns the function's signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Invokes the function with one resolved instance per parameter.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::NotAFunction`] if the value cannot be invoked,
    /// or [`InjectorError::NotRegistered`] if an argument is missing or of the
    /// wrong type.
    pub fn invoke(&self, arguments: Vec<Instance>) -> Result<R, InjectorError> {
        match &self.body {
            Some(body) => body(arguments),
            None => Err(InjectorError::NotAFunction(self.signature.to_string())),
        }
    }

    pub(crate) fn into_parts(self) -> (Signature, Option<Body<R>>) {
        (self.signature, self.body)
    }
}

/// Converts a value into a [`FunctionValue`].
///
/// # Marker Types
///
/// The `Marker` type parameter allows one implementation per function arity
/// alongside the implementation for non-function values.
pub trait IntoFunction<Marker>: Sized {
    /// The native return type of the function.
    type Output: Returns;

    /// Describes this value.
    fn into_function(self) -> FunctionValue<Self::Output>;
}

/// Marker for `Arc<T>` values, which are never functions.
pub struct ValueMarker;

impl<T: ?Sized + Send + Sync + 'static> IntoFunction<ValueMarker> for Arc<T> {
    type Output = ();

    fn into_function(self) -> FunctionValue<()> {
        FunctionValue::not_a_function(core::any::type_name::<Arc<T>>())
    }
}

fn next_argument<P: Dependency>(
    arguments: &mut slice::Iter<'_, Instance>,
) -> Result<P, InjectorError> {
    arguments
        .next()
        .and_then(P::from_instance)
        .ok_or_else(|| InjectorError::not_registered(P::param().key.name()))
}

// ─────────────────────────────────────────────────────────────────────────────
// IntoFunction implementations for functions with 0-8 parameters
// ─────────────────────────────────────────────────────────────────────────────

/// Marker type for functions.
pub struct FunctionMarker;

// 0 parameters
impl<Func, Ret> IntoFunction<(FunctionMarker, fn() -> Ret)> for Func
where
    Func: Fn() -> Ret + Send + Sync + 'static,
    Ret: Returns,
{
    type Output = Ret;

    fn into_function(self) -> FunctionValue<Ret> {
        let signature =
            Signature::function(core::any::type_name::<Func>(), Vec::new(), Ret::returns());
        FunctionValue::new(signature, move |_arguments| Ok(self()))
    }
}

macro_rules! impl_into_function {
    ($($param:ident),*) => {
        impl<Func, Ret, $($param),*> IntoFunction<(FunctionMarker, fn($($param),*) -> Ret)> for Func
        where
            Func: Fn($($param),*) -> Ret + Send + Sync + 'static,
            Ret: Returns,
            $($param: Dependency,)*
        {
            type Output = Ret;

            fn into_function(self) -> FunctionValue<Ret> {
                let signature = Signature::function(
                    core::any::type_name::<Func>(),
                    vec![$($param::param()),*],
                    Ret::returns(),
                );
                FunctionValue::new(signature, move |arguments| {
                    let arguments = &mut arguments.iter();
                    Ok(self($(next_argument::<$param>(arguments)?),*))
                })
            }
        }
    };
}

// Generate impls for 1 to 8 parameters
all_tuples!(impl_into_function, 1, 8, P);
