//! Recursive instantiation by lifecycle.

use std::sync::Arc;

use lodestar_search::Reorder;

use crate::error::{BadState, InjectorError};
use crate::function::Instance;
use crate::injector::State;
use crate::key::TypeKey;
use crate::pool::ScopeStack;
use crate::record::{Invoker, Lifecycle, ObjectRecord};

impl State {
    /// Fails unless the last verification succeeded and is still current.
    pub(crate) fn ensure_verified(&self) -> Result<(), InjectorError> {
        let status = self.status.read();
        if status.verified {
            return Ok(());
        }

        let reason = match &status.error {
            Some(error) => BadState::VerificationFailed(Box::new(error.clone())),
            None => BadState::Unverified,
        };
        Err(InjectorError::BadState(reason))
    }

    /// Resolves `key` within the scope tracked by `stack`.
    pub(crate) fn resolve(
        &self,
        key: &TypeKey,
        stack: &mut ScopeStack,
    ) -> Result<Instance, InjectorError> {
        let record = self
            .library
            .find(key, Reorder::Promote)
            .ok_or_else(|| InjectorError::not_registered(key.name()))?;

        match record.lifecycle() {
            Lifecycle::Transient => self.build(&record, stack),
            Lifecycle::Scoped => {
                if let Some(instance) = stack.find(key) {
                    return Ok(instance);
                }
                let instance = self.build(&record, stack)?;
                stack.push(*key, Arc::clone(&instance));
                Ok(instance)
            }
            Lifecycle::Singleton => record.singleton_or_build(|| self.build(&record, stack)),
        }
    }

    /// Resolves every key, reporting all failures rather than the first.
    pub(crate) fn resolve_all(
        &self,
        keys: impl Iterator<Item = TypeKey>,
        stack: &mut ScopeStack,
    ) -> Result<Vec<Instance>, InjectorError> {
        let mut instances = Vec::new();
        let mut errors = Vec::new();
        for key in keys {
            match self.resolve(&key, stack) {
                Ok(instance) => instances.push(instance),
                Err(error) => errors.push(error),
            }
        }

        match InjectorError::join(errors) {
            Some(error) => Err(error),
            None => Ok(instances),
        }
    }

    fn build(
        &self,
        record: &ObjectRecord,
        stack: &mut ScopeStack,
    ) -> Result<Instance, InjectorError> {
        record.invoker().invoke(self, stack)
    }
}

impl Invoker {
    /// Resolves the parameters in order and runs the constructor.
    ///
    /// The first parameter that fails to resolve aborts the build.
    fn invoke(&self, state: &State, stack: &mut ScopeStack) -> Result<Instance, InjectorError> {
        let arguments = self
            .params
            .iter()
            .map(|param| state.resolve(param, stack))
            .collect::<Result<Vec<_>, _>>()?;
        (self.constructor)(arguments)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::Injector;
    use crate::error::ErrorKind;

    use super::*;

    struct Session {
        id: usize,
    }

    struct Handler {
        first: Arc<Session>,
        second: Arc<Session>,
    }

    fn injector(sessions: &Arc<AtomicUsize>) -> Injector {
        let injector = Injector::new();
        let counter = Arc::clone(sessions);
        injector
            .register_scoped::<Session, _>(move || {
                Arc::new(Session {
                    id: counter.fetch_add(1, Ordering::SeqCst),
                })
            })
            .unwrap();
        injector
            .register_transient::<Handler, _>(|first: Arc<Session>, second: Arc<Session>| {
                Arc::new(Handler { first, second })
            })
            .unwrap();
        injector.verify().unwrap();
        injector
    }

    #[test]
    fn scoped_instances_are_shared_within_one_request() {
        let sessions = Arc::new(AtomicUsize::new(0));
        let injector = injector(&sessions);

        let handler = injector.get::<Handler>().unwrap();
        assert!(Arc::ptr_eq(&handler.first, &handler.second));

        let next = injector.get::<Handler>().unwrap();
        assert_ne!(handler.first.id, next.first.id);
        assert_eq!(sessions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unverified_state_is_distinguished_from_failed_verification() {
        let injector = Injector::new();
        let state = injector.state().unwrap();
        let error = state.ensure_verified().unwrap_err();
        assert!(matches!(error, InjectorError::BadState(BadState::Unverified)));

        injector
            .register_transient::<Handler, _>(|first: Arc<Session>, second: Arc<Session>| {
                Arc::new(Handler { first, second })
            })
            .unwrap();
        assert!(injector.verify().is_err());

        let error = state.ensure_verified().unwrap_err();
        assert!(error.is(ErrorKind::BadState));
        assert!(error.is(ErrorKind::NotRegistered));
    }

    #[test]
    fn resolve_all_joins_every_failure() {
        struct Missing;
        struct AlsoMissing;

        let sessions = Arc::new(AtomicUsize::new(0));
        let injector = injector(&sessions);
        let state = injector.state().unwrap();
        let mut stack = state.pool.check_out();

        let keys = [
            TypeKey::of::<Missing>(),
            TypeKey::of::<Session>(),
            TypeKey::of::<AlsoMissing>(),
        ];
        let error = state
            .resolve_all(keys.into_iter(), &mut stack)
            .unwrap_err();

        let InjectorError::Multiple(errors) = error else {
            panic!("expected joined errors");
        };
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|error| error.kind() == ErrorKind::NotRegistered));
    }
}
