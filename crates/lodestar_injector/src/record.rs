//! Per-type registration records.

use core::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::error::InjectorError;
use crate::function::{Instance, Outcome, Returns, Signature};
use crate::key::TypeKey;

/// How often a registered constructor runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// A new instance for every resolution.
    Transient,
    /// One instance per top-level `get` or `call`.
    Scoped,
    /// One instance for the lifetime of the injector.
    Singleton,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transient => "transient",
            Self::Scoped => "scoped",
            Self::Singleton => "singleton",
        })
    }
}

/// A type-erased constructor over resolved arguments.
pub(crate) type Constructor =
    Arc<dyn Fn(Vec<Instance>) -> Result<Instance, InjectorError> + Send + Sync>;

/// Resolves a record's parameters and runs its constructor.
///
/// Built once per record on first resolution.
pub(crate) struct Invoker {
    pub(crate) params: Vec<TypeKey>,
    pub(crate) constructor: Constructor,
}

/// Everything the injector knows about one registered type.
pub struct ObjectRecord {
    key: TypeKey,
    signature: Signature,
    constructor: Constructor,
    lifecycle: Lifecycle,
    returns_error: bool,
    invoker: OnceLock<Invoker>,
    singleton: OnceLock<Instance>,
    build_lock: Mutex<()>,
}

impl ObjectRecord {
    /// Creates a record from a validated constructor body.
    pub(crate) fn new<R: Returns>(
        key: TypeKey,
        lifecycle: Lifecycle,
        returns_error: bool,
        signature: Signature,
        body: impl Fn(Vec<Instance>) -> Result<R, InjectorError> + Send + Sync + 'static,
    ) -> Self {
        let name = key.name();
        let constructor: Constructor = Arc::new(
            move |arguments: Vec<Instance>| -> Result<Instance, InjectorError> {
                let Outcome { value, error } = body(arguments)?.into_outcome();
                if let Some(error) = error {
                    return Err(InjectorError::Constructor(error));
                }
                value.ok_or(InjectorError::NoReturns(name))
            },
        );
        Self::from_constructor(key, lifecycle, returns_error, signature, constructor)
    }

    pub(crate) fn from_constructor(
        key: TypeKey,
        lifecycle: Lifecycle,
        returns_error: bool,
        signature: Signature,
        constructor: Constructor,
    ) -> Self {
        Self {
            key,
            signature,
            constructor,
            lifecycle,
            returns_error,
            invoker: OnceLock::new(),
            singleton: OnceLock::new(),
            build_lock: Mutex::new(()),
        }
    }

    /// Returns the key this record is registered under.
    #[must_use]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Returns the constructor's signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the lifecycle policy.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns `true` if the constructor reports errors through `Result`.
    #[must_use]
    pub fn returns_error(&self) -> bool {
        self.returns_error
    }

    /// Returns `true` once a singleton instance has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.singleton.get().is_some()
    }

    pub(crate) fn invoker(&self) -> &Invoker {
        self.invoker.get_or_init(|| Invoker {
            params: self.signature.param_keys().collect(),
            constructor: Arc::clone(&self.constructor),
        })
    }

    /// Builds the singleton at most once.
    ///
    /// Concurrent callers block on the record's build lock; the first one
    /// runs `build`, the rest observe its result. A failed build leaves the
    /// slot empty.
    pub(crate) fn singleton_or_build(
        &self,
        build: impl FnOnce() -> Result<Instance, InjectorError>,
    ) -> Result<Instance, InjectorError> {
        if let Some(instance) = self.singleton.get() {
            return Ok(Arc::clone(instance));
        }

        let _guard = self.build_lock.lock();
        if let Some(instance) = self.singleton.get() {
            return Ok(Arc::clone(instance));
        }

        let instance = build()?;
        tracing::trace!(key = self.key.name(), "singleton built");
        Ok(Arc::clone(self.singleton.get_or_init(|| instance)))
    }
}

impl fmt::Debug for ObjectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRecord")
            .field("key", &self.key)
            .field("lifecycle", &self.lifecycle)
            .field("signature", &self.signature.to_string())
            .field("returns_error", &self.returns_error)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{IntoFunction, downcast};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Widget(usize);

    fn record(lifecycle: Lifecycle) -> ObjectRecord {
        let (signature, body) = (|| Arc::new(Widget(7))).into_function().into_parts();
        ObjectRecord::new(
            TypeKey::of::<Widget>(),
            lifecycle,
            false,
            signature,
            body.unwrap(),
        )
    }

    #[test]
    fn invoker_is_memoized() {
        let record = record(Lifecycle::Transient);
        let first: *const Invoker = record.invoker();
        let second: *const Invoker = record.invoker();
        assert_eq!(first, second);
        assert!(record.invoker().params.is_empty());
    }

    #[test]
    fn constructor_erases_value() {
        let record = record(Lifecycle::Transient);
        let instance = (record.invoker().constructor)(Vec::new()).unwrap();
        assert_eq!(downcast::<Widget>(&instance).unwrap().0, 7);
    }

    #[test]
    fn singleton_builds_once() {
        let record = record(Lifecycle::Singleton);
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            (record.invoker().constructor)(Vec::new())
        };

        assert!(!record.is_built());
        let first = record.singleton_or_build(build).unwrap();
        let second = record
            .singleton_or_build(|| unreachable!("slot already filled"))
            .unwrap();

        assert!(record.is_built());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_singleton_build_leaves_slot_empty() {
        let record = record(Lifecycle::Singleton);
        let result = record.singleton_or_build(|| Err(InjectorError::not_registered("Widget")));

        assert!(result.is_err());
        assert!(!record.is_built());
    }

    #[test]
    fn lifecycle_display() {
        assert_eq!(Lifecycle::Scoped.to_string(), "scoped");
        assert_eq!(Lifecycle::Singleton.to_string(), "singleton");
    }
}
