//! The injector facade: registration, lookup and function-call injection.

use core::fmt;
use std::sync::{Arc, Weak};

use lodestar_search::{Cache, Reorder};
use parking_lot::{Mutex, RwLock};

use crate::config::{CacheStrategy, InjectorConfig};
use crate::error::{BadState, InjectorError};
use crate::function::{IntoFunction, ReturnType, Signature, downcast, instance};
use crate::key::TypeKey;
use crate::names::NameIndex;
use crate::pool::StackPool;
use crate::record::{Lifecycle, ObjectRecord};

/// Verification outcome of the current registry contents.
#[derive(Default)]
pub(crate) struct Status {
    pub(crate) verified: bool,
    pub(crate) error: Option<InjectorError>,
}

/// Shared state behind every [`Injector`] handle.
pub(crate) struct State {
    pub(crate) library: Box<dyn Cache<TypeKey, Arc<ObjectRecord>>>,
    pub(crate) names: RwLock<Box<dyn NameIndex>>,
    pub(crate) pool: StackPool,
    pub(crate) status: RwLock<Status>,
    registration: Mutex<()>,
    strategy: CacheStrategy,
}

#[derive(Clone)]
enum StateRef {
    Owned(Arc<State>),
    /// Handle resolved from the injector itself; does not keep it alive.
    Borrowed(Weak<State>),
}

/// A dependency injector.
///
/// Constructors are registered per type together with a [`Lifecycle`],
/// checked as a whole by [`verify`](Self::verify), and then used to build
/// fully wired values on demand through [`get`](Self::get) or to supply the
/// arguments of arbitrary functions through the `call` family.
///
/// `Injector` is a cheap handle: clones share the same registry. Every
/// injector registers itself as a singleton, so constructors may depend on
/// `Arc<Injector>`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lodestar_injector::Injector;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let injector = Injector::new();
/// injector
///     .register_singleton::<dyn Greeter, _>(|| Arc::new(English) as Arc<dyn Greeter>)
///     .unwrap();
/// injector.verify().unwrap();
///
/// let greeter = injector.get::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
///
/// let greeting = injector
///     .call1(|greeter: Arc<dyn Greeter>| greeter.greet())
///     .unwrap();
/// assert_eq!(greeting, "hello");
/// ```
#[derive(Clone)]
pub struct Injector {
    state: StateRef,
}

impl Injector {
    /// Creates an injector with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(InjectorConfig::default())
    }

    /// Creates an injector backed by the given lookup strategy.
    #[must_use]
    pub fn with_strategy(strategy: CacheStrategy) -> Self {
        Self::with_config(InjectorConfig::new().with_strategy(strategy))
    }

    /// Creates an injector from a full configuration.
    #[must_use]
    pub fn with_config(config: InjectorConfig) -> Self {
        let state = Arc::new(State {
            library: config.strategy.build(),
            names: RwLock::new(config.name_index),
            pool: StackPool::new(config.scope_capacity),
            status: RwLock::new(Status::default()),
            registration: Mutex::new(()),
            strategy: config.strategy,
        });
        register_self(&state);
        tracing::debug!(strategy = %config.strategy, "injector created");

        Self {
            state: StateRef::Owned(state),
        }
    }

    pub(crate) fn state(&self) -> Result<Arc<State>, InjectorError> {
        match &self.state {
            StateRef::Owned(state) => Ok(Arc::clone(state)),
            StateRef::Borrowed(state) => state
                .upgrade()
                .ok_or(InjectorError::BadState(BadState::Dropped)),
        }
    }

    fn state_ptr(&self) -> *const State {
        match &self.state {
            StateRef::Owned(state) => Arc::as_ptr(state),
            StateRef::Borrowed(state) => state.as_ptr(),
        }
    }

    /// Returns `true` if both handles refer to the same injector.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.state_ptr(), other.state_ptr())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Registers a constructor that runs on every resolution of `K`.
    ///
    /// # Errors
    ///
    /// Returns an error if `K` or the constructor fails validation; see
    /// [`register_by_key`](Self::register_by_key).
    pub fn register_transient<K, M>(
        &self,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.register_by_key(TypeKey::of::<K>(), Lifecycle::Transient, false, constructor)
    }

    /// Registers a fallible constructor that runs on every resolution of `K`.
    ///
    /// # Errors
    ///
    /// See [`register_by_key`](Self::register_by_key).
    pub fn register_transient_error<K, M>(
        &self,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.register_by_key(TypeKey::of::<K>(), Lifecycle::Transient, true, constructor)
    }

    /// Registers a constructor that runs once per top-level request.
    ///
    /// # Errors
    ///
    /// See [`register_by_key`](Self::register_by_key).
    pub fn register_scoped<K, M>(
        &self,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.register_by_key(TypeKey::of::<K>(), Lifecycle::Scoped, false, constructor)
    }

    /// Registers a fallible constructor that runs once per top-level request.
    ///
    /// # Errors
    ///
    /// See [`register_by_key`](Self::register_by_key).
    pub fn register_scoped_error<K, M>(
        &self,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.register_by_key(TypeKey::of::<K>(), Lifecycle::Scoped, true, constructor)
    }

    /// Registers a constructor that runs at most once.
    ///
    /// # Errors
    ///
    /// See [`register_by_key`](Self::register_by_key).
    pub fn register_singleton<K, M>(
        &self,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.register_by_key(TypeKey::of::<K>(), Lifecycle::Singleton, false, constructor)
    }

    /// Registers a fallible constructor that runs until it first succeeds.
    ///
    /// # Errors
    ///
    /// See [`register_by_key`](Self::register_by_key).
    pub fn register_singleton_error<K, M>(
        &self,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError>
    where
        K: ?Sized + Send + Sync + 'static,
    {
        self.register_by_key(TypeKey::of::<K>(), Lifecycle::Singleton, true, constructor)
    }

    /// Registers a constructor for a key known only at runtime.
    ///
    /// `fallible` selects the `Result<Arc<K>, E>` constructor shape.
    /// A successful registration invalidates any previous verification.
    ///
    /// # Errors
    ///
    /// Checked in order:
    ///
    /// - [`InjectorError::NotStructOrInterface`] if `key` is not a struct, a
    ///   trait object, or a pointer to one
    /// - [`InjectorError::NotAFunction`] if `constructor` is not a function
    /// - [`InjectorError::VariadicArguments`] if it takes a [`Variadic`](crate::Variadic)
    /// - [`InjectorError::WrongNumberOfReturns`] if `fallible` and it does not
    ///   return `Result`
    /// - [`InjectorError::NoReturns`] / [`InjectorError::TooManyReturns`] if
    ///   not `fallible` and it does not return exactly one value
    /// - [`InjectorError::NotAssignable`] if it returns a type other than `key`
    /// - [`InjectorError::AlreadyRegistered`] if `key` already has a constructor
    pub fn register_by_key<M>(
        &self,
        key: TypeKey,
        lifecycle: Lifecycle,
        fallible: bool,
        constructor: impl IntoFunction<M>,
    ) -> Result<(), InjectorError> {
        let state = self.state()?;

        if !key.is_registerable() {
            return Err(InjectorError::NotStructOrInterface(key.name()));
        }

        let function = constructor.into_function();
        validate_constructor(key, fallible, function.signature())?;

        let _registration = state.registration.lock();
        if state.library.find(&key, Reorder::Promote).is_some() {
            return Err(InjectorError::AlreadyRegistered(key.name()));
        }

        let (signature, body) = function.into_parts();
        let Some(body) = body else {
            return Err(InjectorError::NotAFunction(signature.to_string()));
        };
        let record = ObjectRecord::new(key, lifecycle, fallible, signature, body);
        state.library.add(key, Arc::new(record));
        state.names.write().add(key.short_name(), key);

        let mut status = state.status.write();
        status.verified = false;
        status.error = None;

        tracing::debug!(key = key.name(), %lifecycle, fallible, "registered constructor");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────

    /// Checks that every registered constructor's dependencies are registered
    /// and acyclic.
    ///
    /// Must be called after the last registration and before any resolution.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::NotRegistered`] or
    /// [`InjectorError::DependencyLoop`] for the first offending constructor.
    /// The error is also kept and re-surfaced by every resolution until a
    /// later `verify` succeeds.
    pub fn verify(&self) -> Result<(), InjectorError> {
        self.state()?.verify()
    }

    /// Returns `true` if the last `verify` succeeded and nothing has been
    /// registered since.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.state()
            .map(|state| state.status.read().verified)
            .unwrap_or(false)
    }

    /// Returns the error of the last failed `verify`, if it has not been
    /// superseded.
    #[must_use]
    pub fn verification_error(&self) -> Option<InjectorError> {
        self.state()
            .ok()
            .and_then(|state| state.status.read().error.clone())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────

    /// Resolves an instance of `K`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::BadState`] if the injector is not verified,
    /// [`InjectorError::NotRegistered`] if `K` has no constructor, or the
    /// first error raised while building `K` or its dependencies.
    pub fn get<K: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<K>, InjectorError> {
        let key = TypeKey::of::<K>();
        let instance = self.get_by_key(&key)?;
        downcast::<K>(&instance).ok_or(InjectorError::NotAssignable {
            expected: key.name(),
            found: core::any::type_name_of_val(&*instance),
        })
    }

    /// Resolves the type-erased instance registered under `key`.
    ///
    /// The instance downcasts to `Arc<K>` for the type `K` of `key`.
    ///
    /// # Errors
    ///
    /// See [`get`](Self::get).
    pub fn get_by_key(&self, key: &TypeKey) -> Result<crate::Instance, InjectorError> {
        let state = self.state()?;
        state.ensure_verified()?;

        let mut stack = state.pool.check_out();
        state.resolve(key, &mut stack)
    }

    /// Resolves the type indexed under a short name such as `"Database"`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::NotRegistered`] if no type is indexed under
    /// `name`, even when the injector is not verified; otherwise see
    /// [`get`](Self::get).
    pub fn get_by_name(&self, name: &str) -> Result<crate::Instance, InjectorError> {
        let key = self
            .state()?
            .names
            .read()
            .find(name)
            .ok_or_else(|| InjectorError::not_registered(name))?;
        self.get_by_key(&key)
    }

    /// Returns the record registered under `key` without resolving it.
    #[must_use]
    pub fn record(&self, key: &TypeKey) -> Option<Arc<ObjectRecord>> {
        self.state()
            .ok()
            .and_then(|state| state.library.find(key, Reorder::Preserve))
    }

    /// Returns the number of registered types, including the injector itself.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state().map(|state| state.library.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is registered.
    ///
    /// Only possible for a handle whose injector has been dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the registry's lookup strategy.
    #[must_use]
    pub fn strategy(&self) -> Option<CacheStrategy> {
        self.state().ok().map(|state| state.strategy)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function-call injection
    // ─────────────────────────────────────────────────────────────────────

    /// Calls a function that returns nothing, resolving its arguments.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::NotAFunction`],
    /// [`InjectorError::WrongNumberOfReturns`] or
    /// [`InjectorError::VariadicArguments`] if the function has the wrong
    /// shape, [`InjectorError::BadState`] if the injector is not verified, or
    /// every error raised while resolving the arguments.
    pub fn call<M>(&self, function: impl IntoFunction<M>) -> Result<(), InjectorError> {
        self.invoke(function, Some(0)).map(drop)
    }

    /// Calls a function that returns one value.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub fn call1<F: IntoFunction<M>, M>(&self, function: F) -> Result<F::Output, InjectorError> {
        self.invoke(function, Some(1))
    }

    /// Calls a function that returns two values.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub fn call2<F: IntoFunction<M>, M>(&self, function: F) -> Result<F::Output, InjectorError> {
        self.invoke(function, Some(2))
    }

    /// Calls a function that returns three values.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub fn call3<F: IntoFunction<M>, M>(&self, function: F) -> Result<F::Output, InjectorError> {
        self.invoke(function, Some(3))
    }

    /// Calls a function that returns four values.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call).
    pub fn call4<F: IntoFunction<M>, M>(&self, function: F) -> Result<F::Output, InjectorError> {
        self.invoke(function, Some(4))
    }

    /// Calls a function with any number of return values.
    ///
    /// # Errors
    ///
    /// See [`call`](Self::call); the return count is not checked.
    pub fn call_n<F: IntoFunction<M>, M>(&self, function: F) -> Result<F::Output, InjectorError> {
        self.invoke(function, None)
    }

    fn invoke<F: IntoFunction<M>, M>(
        &self,
        function: F,
        expected_returns: Option<usize>,
    ) -> Result<F::Output, InjectorError> {
        let function = function.into_function();
        let signature = function.signature();

        if !signature.is_function() {
            return Err(InjectorError::NotAFunction(signature.to_string()));
        }
        if let Some(expected) = expected_returns
            && signature.returns().len() != expected
        {
            return Err(InjectorError::WrongNumberOfReturns(format!(
                "expected {expected}, found {} in '{signature}'",
                signature.returns().len()
            )));
        }
        if signature.is_variadic() {
            return Err(InjectorError::VariadicArguments(signature.to_string()));
        }

        let state = self.state()?;
        state.ensure_verified()?;

        let arguments = {
            let mut stack = state.pool.check_out();
            state.resolve_all(signature.param_keys(), &mut stack)?
        };
        function.invoke(arguments)
    }
}

fn validate_constructor(
    key: TypeKey,
    fallible: bool,
    signature: &Signature,
) -> Result<(), InjectorError> {
    if !signature.is_function() {
        return Err(InjectorError::NotAFunction(signature.to_string()));
    }
    if signature.is_variadic() {
        return Err(InjectorError::VariadicArguments(signature.to_string()));
    }

    let returns = signature.returns();
    if fallible {
        if !matches!(returns, [ReturnType::Value(_), ReturnType::Error]) {
            return Err(InjectorError::WrongNumberOfReturns(format!(
                "constructor for type '{}' must return (value, error), found '{signature}'",
                key.name()
            )));
        }
    } else if returns.is_empty() {
        return Err(InjectorError::NoReturns(key.name()));
    } else if returns.len() > 1 {
        return Err(InjectorError::TooManyReturns(key.name()));
    }

    match returns.first() {
        Some(ReturnType::Value(found)) if *found == key => Ok(()),
        Some(ReturnType::Value(found)) => Err(InjectorError::NotAssignable {
            expected: key.name(),
            found: found.name(),
        }),
        _ => Err(InjectorError::NoReturns(key.name())),
    }
}

/// Registers the injector as a singleton of its own type.
///
/// The record holds a weak reference so the registry does not keep its own
/// state alive.
fn register_self(state: &Arc<State>) {
    let key = TypeKey::of::<Injector>();
    let weak = Arc::downgrade(state);
    let signature = Signature::function(
        core::any::type_name::<Injector>(),
        Vec::new(),
        vec![ReturnType::Value(key)],
    );
    let record = ObjectRecord::from_constructor(
        key,
        Lifecycle::Singleton,
        false,
        signature,
        Arc::new(move |_: Vec<crate::Instance>| {
            Ok(instance(Arc::new(Injector {
                state: StateRef::Borrowed(weak.clone()),
            })))
        }),
    );

    state.library.add(key, Arc::new(record));
    state.names.write().add(key.short_name(), key);
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Injector {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Injector {}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("strategy", &self.strategy())
            .field("len", &self.len())
            .field("verified", &self.is_verified())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    trait Clock: Send + Sync {
        fn now(&self) -> u64;
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            42
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock)
    }

    #[test]
    fn new_injector_contains_itself() {
        let injector = Injector::new();
        assert_eq!(injector.len(), 1);
        assert!(injector.record(&TypeKey::of::<Injector>()).is_some());
        assert!(!injector.is_verified());
    }

    #[test]
    fn registration_clears_verification() {
        let injector = Injector::new();
        injector.verify().unwrap();
        assert!(injector.is_verified());

        injector.register_singleton::<dyn Clock, _>(clock).unwrap();
        assert!(!injector.is_verified());

        let error = injector.get::<dyn Clock>().err().unwrap();
        assert!(error.is(ErrorKind::BadState));
    }

    #[test]
    fn validation_order_reports_key_kind_first() {
        let injector = Injector::new();
        let error = injector
            .register_transient::<u32, _>(Arc::new(FixedClock))
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotStructOrInterface);
    }

    #[test]
    fn self_handle_does_not_keep_injector_alive() {
        let injector = Injector::new();
        injector.verify().unwrap();
        let handle = injector.get::<Injector>().unwrap();
        assert!(handle.ptr_eq(&injector));

        drop(injector);
        let error = handle.verify().unwrap_err();
        assert!(matches!(error, InjectorError::BadState(BadState::Dropped)));
        assert!(handle.is_empty());
    }

    #[test]
    fn record_lookup_does_not_resolve() {
        let injector = Injector::new();
        injector.register_singleton::<dyn Clock, _>(clock).unwrap();
        injector.verify().unwrap();

        let record = injector.record(&TypeKey::of::<dyn Clock>()).unwrap();
        assert_eq!(record.lifecycle(), Lifecycle::Singleton);
        assert!(!record.is_built());

        assert_eq!(injector.get::<dyn Clock>().unwrap().now(), 42);
        assert!(record.is_built());
    }

    #[test]
    fn unknown_name_is_reported_before_verification() {
        let injector = Injector::new();
        injector.register_singleton::<dyn Clock, _>(clock).unwrap();

        let error = injector.get_by_name("Nope").err().unwrap();
        assert_eq!(error.kind(), ErrorKind::NotRegistered);

        let error = injector.get_by_name("Clock").err().unwrap();
        assert_eq!(error.kind(), ErrorKind::BadState);
    }
}
