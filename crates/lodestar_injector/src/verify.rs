//! Dependency-graph verification.

use std::sync::Arc;

use hashbrown::HashSet;
use lodestar_search::Reorder;

use crate::error::{DependencyChain, InjectorError};
use crate::injector::State;
use crate::key::TypeKey;
use crate::record::ObjectRecord;

/// Bookkeeping for one verification pass.
#[derive(Default)]
struct Walk {
    /// Records from the current root down to the record being expanded.
    path: Vec<Arc<ObjectRecord>>,
    /// Keys whose whole subtree is already known to be sound.
    verified: HashSet<TypeKey>,
}

impl Walk {
    fn chain(&self, last: &'static str) -> DependencyChain {
        let mut links: Vec<&'static str> = self
            .path
            .iter()
            .map(|record| record.key().short_name())
            .collect();
        links.push(last);
        DependencyChain::new(links)
    }
}

impl State {
    /// Walks every registered constructor and records the outcome.
    pub(crate) fn verify(&self) -> Result<(), InjectorError> {
        self.library.prepare();
        let records = self.library.all();
        tracing::debug!(records = records.len(), "verifying dependency graph");

        let mut walk = Walk::default();
        let result = records
            .into_iter()
            .try_for_each(|(_, record)| self.verify_record(&record, &mut walk));

        let mut status = self.status.write();
        match &result {
            Ok(()) => {
                status.verified = true;
                status.error = None;
                tracing::debug!(verified = walk.verified.len(), "dependency graph verified");
            }
            Err(error) => {
                status.verified = false;
                status.error = Some(error.clone());
                tracing::debug!(%error, "dependency graph verification failed");
            }
        }
        result
    }

    fn verify_record(
        &self,
        record: &Arc<ObjectRecord>,
        walk: &mut Walk,
    ) -> Result<(), InjectorError> {
        if walk.verified.contains(&record.key()) {
            return Ok(());
        }

        walk.path.push(Arc::clone(record));
        for param in record.signature().param_keys() {
            let Some(dependency) = self.library.find(&param, Reorder::Preserve) else {
                return Err(InjectorError::NotRegistered {
                    name: param.name().to_owned(),
                    chain: Some(walk.chain(param.short_name())),
                });
            };

            if walk
                .path
                .iter()
                .any(|visited| visited.signature() == dependency.signature())
            {
                return Err(InjectorError::DependencyLoop {
                    chain: walk.chain(dependency.key().short_name()),
                });
            }

            self.verify_record(&dependency, walk)?;
        }
        walk.path.pop();

        walk.verified.insert(record.key());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Injector;
    use crate::config::CacheStrategy;
    use crate::error::{ErrorKind, InjectorError};
    use crate::key::TypeKey;
    use std::sync::Arc;

    struct A;
    struct B;
    struct C;

    #[test]
    fn empty_injector_verifies() {
        let injector = Injector::new();
        injector.verify().unwrap();
        assert!(injector.is_verified());
        assert!(injector.verification_error().is_none());
    }

    #[test]
    fn missing_dependency_reports_full_chain() {
        let injector = Injector::new();
        injector
            .register_transient::<A, _>(|_b: Arc<B>| Arc::new(A))
            .unwrap();
        injector
            .register_transient::<B, _>(|_c: Arc<C>| Arc::new(B))
            .unwrap();

        let error = injector.verify().unwrap_err();
        let InjectorError::NotRegistered { name, chain } = &error else {
            panic!("expected NotRegistered, got {error}");
        };
        assert!(name.ends_with("C"));
        let links = chain.as_ref().unwrap().links();
        assert_eq!(links.last(), Some(&"C"));
        assert!(links.ends_with(&["B", "C"]));

        assert!(!injector.is_verified());
        assert!(injector.verification_error().unwrap().is(ErrorKind::NotRegistered));
    }

    #[test]
    fn three_node_cycle_is_detected() {
        let injector = Injector::new();
        injector
            .register_transient::<A, _>(|_b: Arc<B>| Arc::new(A))
            .unwrap();
        injector
            .register_transient::<B, _>(|_c: Arc<C>| Arc::new(B))
            .unwrap();
        injector
            .register_transient::<C, _>(|_a: Arc<A>| Arc::new(C))
            .unwrap();

        let error = injector.verify().unwrap_err();
        let InjectorError::DependencyLoop { chain } = &error else {
            panic!("expected DependencyLoop, got {error}");
        };
        let links = chain.links();
        assert_eq!(links.len(), 4);
        assert_eq!(links.first(), links.last());
    }

    #[test]
    fn failed_verification_recovers_after_fix() {
        let injector = Injector::new();
        injector
            .register_transient::<A, _>(|_b: Arc<B>| Arc::new(A))
            .unwrap();
        assert!(injector.verify().is_err());
        assert!(injector.get::<A>().err().unwrap().is(ErrorKind::NotRegistered));

        injector.register_transient::<B, _>(|| Arc::new(B)).unwrap();
        injector.verify().unwrap();
        assert!(injector.get::<A>().is_ok());
    }

    fn library_order(injector: &Injector) -> Vec<TypeKey> {
        let state = injector.state().unwrap();
        state.library.all().map(|(key, _)| key).collect()
    }

    #[test]
    fn verification_preserves_lookup_order() {
        for strategy in [CacheStrategy::BubbleList, CacheStrategy::PriorityList] {
            let injector = Injector::with_strategy(strategy);
            injector
                .register_transient::<A, _>(|_b: Arc<B>| Arc::new(A))
                .unwrap();
            injector
                .register_transient::<B, _>(|_c: Arc<C>| Arc::new(B))
                .unwrap();
            injector.register_transient::<C, _>(|| Arc::new(C)).unwrap();

            let before = library_order(&injector);
            injector.verify().unwrap();
            injector.verify().unwrap();
            assert_eq!(library_order(&injector), before, "{strategy}");
        }
    }
}
