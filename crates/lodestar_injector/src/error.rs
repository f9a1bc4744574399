//! Error types for registration, verification and resolution.

use core::fmt;
use std::error::Error;
use std::sync::Arc;

/// A boxed error produced by a fallible constructor.
pub type ConstructorError = Arc<dyn Error + Send + Sync>;

/// Errors returned by the injector.
///
/// Every variant except [`Constructor`](Self::Constructor) is an injector
/// error proper; use [`is_injector_error`](Self::is_injector_error) to tell
/// them apart from failures raised by user constructors, and
/// [`is`](Self::is) to test for a specific [`ErrorKind`] through wrapping.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InjectorError {
    /// A constructor has already been registered for the key.
    #[error("already registered: constructor for type '{0}'")]
    AlreadyRegistered(&'static str),

    /// Resolution was attempted on an injector that is not verified.
    #[error("bad injector state: {0}")]
    BadState(#[source] BadState),

    /// A constructor transitively depends on itself.
    #[error("dependency loop detected\n\t{chain}")]
    DependencyLoop {
        /// The path from the verified root to the repeated constructor.
        chain: DependencyChain,
    },

    /// A constructor declares no return value.
    #[error("no return values, must be exactly 1 return value: constructor for type '{0}'")]
    NoReturns(&'static str),

    /// A value that is not a function was supplied where one is required.
    #[error("value is not a function: {0}")]
    NotAFunction(String),

    /// A constructor's return type differs from the key it is registered under.
    #[error("value is not assignable: return type '{found}' is not assignable to type '{expected}'")]
    NotAssignable {
        /// The key the constructor was registered under.
        expected: &'static str,
        /// The type the constructor returns.
        found: &'static str,
    },

    /// A required type has no registered constructor.
    #[error("not registered: {}", not_registered_message(.name, .chain.as_ref()))]
    NotRegistered {
        /// Name of the missing type (or the unmatched short name).
        name: String,
        /// The path leading to the missing type, when found by verification.
        chain: Option<DependencyChain>,
    },

    /// The key is not a struct, a trait object, or a pointer to one.
    #[error("key type is not a struct or interface: type '{0}'")]
    NotStructOrInterface(&'static str),

    /// A constructor declares more than one return value.
    #[error("too many return values, must be exactly 1 return value: constructor for type '{0}'")]
    TooManyReturns(&'static str),

    /// A function takes a variadic parameter.
    #[error("function has a variadic signature: {0}")]
    VariadicArguments(String),

    /// A function declares a different number of return values than expected.
    #[error("wrong number of return values: {0}")]
    WrongNumberOfReturns(String),

    /// A fallible constructor returned an error.
    #[error("{0}")]
    Constructor(ConstructorError),

    /// Several independent parameters failed to resolve.
    #[error("{}", join_messages(.0))]
    Multiple(Vec<InjectorError>),
}

fn not_registered_message(name: &str, chain: Option<&DependencyChain>) -> String {
    match chain {
        Some(chain) => format!("constructor for type '{name}'\n\t{chain}"),
        None => format!("type '{name}'"),
    }
}

fn join_messages(errors: &[InjectorError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The reason an injector refused to resolve.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BadState {
    /// `verify` has not been called since the last registration.
    #[error("injector is not in a verified state, call verify() after registering all types")]
    Unverified,

    /// The last call to `verify` failed.
    #[error("injector is in a bad state with verification error: {0}")]
    VerificationFailed(Box<InjectorError>),

    /// The injector behind a self-resolved handle has been dropped.
    #[error("injector has been dropped")]
    Dropped,
}

/// The kind of an [`InjectorError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`InjectorError::AlreadyRegistered`].
    AlreadyRegistered,
    /// See [`InjectorError::BadState`].
    BadState,
    /// See [`InjectorError::DependencyLoop`].
    DependencyLoop,
    /// See [`InjectorError::NoReturns`].
    NoReturns,
    /// See [`InjectorError::NotAFunction`].
    NotAFunction,
    /// See [`InjectorError::NotAssignable`].
    NotAssignable,
    /// See [`InjectorError::NotRegistered`].
    NotRegistered,
    /// See [`InjectorError::NotStructOrInterface`].
    NotStructOrInterface,
    /// See [`InjectorError::TooManyReturns`].
    TooManyReturns,
    /// See [`InjectorError::VariadicArguments`].
    VariadicArguments,
    /// See [`InjectorError::WrongNumberOfReturns`].
    WrongNumberOfReturns,
    /// See [`InjectorError::Constructor`].
    Constructor,
    /// See [`InjectorError::Multiple`].
    Multiple,
}

impl InjectorError {
    /// Returns the kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::BadState(_) => ErrorKind::BadState,
            Self::DependencyLoop { .. } => ErrorKind::DependencyLoop,
            Self::NoReturns(_) => ErrorKind::NoReturns,
            Self::NotAFunction(_) => ErrorKind::NotAFunction,
            Self::NotAssignable { .. } => ErrorKind::NotAssignable,
            Self::NotRegistered { .. } => ErrorKind::NotRegistered,
            Self::NotStructOrInterface(_) => ErrorKind::NotStructOrInterface,
            Self::TooManyReturns(_) => ErrorKind::TooManyReturns,
            Self::VariadicArguments(_) => ErrorKind::VariadicArguments,
            Self::WrongNumberOfReturns(_) => ErrorKind::WrongNumberOfReturns,
            Self::Constructor(_) => ErrorKind::Constructor,
            Self::Multiple(_) => ErrorKind::Multiple,
        }
    }

    /// Returns `true` if this error, or any error it wraps, has the given kind.
    ///
    /// A verification failure re-surfaced under [`BadState`] matches both
    /// `BadState` and the original kind; joined errors match any member.
    ///
    /// ```
    /// use lodestar_injector::error::{BadState, ErrorKind, InjectorError};
    ///
    /// let loop_error = InjectorError::DependencyLoop { chain: Default::default() };
    /// let error = InjectorError::BadState(BadState::VerificationFailed(Box::new(loop_error)));
    ///
    /// assert!(error.is(ErrorKind::BadState));
    /// assert!(error.is(ErrorKind::DependencyLoop));
    /// assert!(!error.is(ErrorKind::NotRegistered));
    /// ```
    #[must_use]
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind() == kind {
            return true;
        }
        match self {
            Self::BadState(BadState::VerificationFailed(cause)) => cause.is(kind),
            Self::Multiple(errors) => errors.iter().any(|error| error.is(kind)),
            _ => false,
        }
    }

    /// Returns `true` for errors raised by the injector itself, `false` for
    /// errors passed through from user constructors.
    #[must_use]
    pub fn is_injector_error(&self) -> bool {
        match self {
            Self::Constructor(_) => false,
            Self::Multiple(errors) => errors.iter().all(Self::is_injector_error),
            _ => true,
        }
    }

    /// Returns the constructor error this error carries, if any.
    #[must_use]
    pub fn constructor_error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        match self {
            Self::Constructor(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    /// Joins sibling failures, collapsing a single error to itself.
    pub(crate) fn join(mut errors: Vec<InjectorError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    pub(crate) fn not_registered(name: impl Into<String>) -> Self {
        Self::NotRegistered {
            name: name.into(),
            chain: None,
        }
    }
}

/// A path through the dependency graph, rendered as `A -> B -> C`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyChain(Vec<&'static str>);

impl DependencyChain {
    /// Creates a chain from type names, root first.
    #[must_use]
    pub fn new(links: Vec<&'static str>) -> Self {
        Self(links)
    }

    /// Returns the type names in the chain, root first.
    #[must_use]
    pub fn links(&self) -> &[&'static str] {
        &self.0
    }
}

impl fmt::Display for DependencyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, link) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(link)?;
        }
        Ok(())
    }
}
