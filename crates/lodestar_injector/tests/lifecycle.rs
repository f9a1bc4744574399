//! Construction counts per lifecycle, across strategies and call patterns.


use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lodestar_injector::{CacheStrategy, Injector, Lifecycle, TypeKey};
use proptest::prelude::*;

struct Leaf;

struct Branch {
    left: Arc<Leaf>,
    right: Arc<Leaf>,
}

struct Root {
    branch: Arc<Branch>,
    leaf: Arc<Leaf>,
}

/// Registers `Root -> Branch -> Leaf` (plus `Root -> Leaf`) and returns the
/// number of times `Leaf` has been constructed.
fn wire(injector: &Injector, leaf_lifecycle: Lifecycle) -> Arc<AtomicUsize> {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    injector
        .register_by_key(
            TypeKey::of::<Leaf>(),
            leaf_lifecycle,
            false,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Arc::new(Leaf)
            },
        )
        .unwrap();
    injector
        .register_transient::<Branch, _>(|left: Arc<Leaf>, right: Arc<Leaf>| {
            Arc::new(Branch { left, right })
        })
        .unwrap();
    injector
        .register_transient::<Root, _>(|branch: Arc<Branch>, leaf: Arc<Leaf>| {
            Arc::new(Root { branch, leaf })
        })
        .unwrap();
    injector.verify().unwrap();
    builds
}

fn lifecycle() -> impl Strategy<Value = Lifecycle> {
    prop_oneof![
        Just(Lifecycle::Transient),
        Just(Lifecycle::Scoped),
        Just(Lifecycle::Singleton),
    ]
}

fn strategy() -> impl Strategy<Value = CacheStrategy> {
    prop_oneof![
        Just(CacheStrategy::Map),
        Just(CacheStrategy::BubbleList),
        Just(CacheStrategy::PriorityList),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn construction_counts_follow_lifecycle(
        strategy in strategy(),
        leaf_lifecycle in lifecycle(),
        requests in 1_usize..12,
    ) {
        let injector = Injector::with_strategy(strategy);
        let builds = wire(&injector, leaf_lifecycle);

        for _ in 0..requests {
            let root = injector.get::<Root>().unwrap();
            let shared = Arc::ptr_eq(&root.leaf, &root.branch.left)
                && Arc::ptr_eq(&root.branch.left, &root.branch.right);
            prop_assert_eq!(shared, leaf_lifecycle != Lifecycle::Transient);
        }

        // Each request needs three leaves.
        let expected = match leaf_lifecycle {
            Lifecycle::Transient => 3 * requests,
            Lifecycle::Scoped => requests,
            Lifecycle::Singleton => 1,
        };
        prop_assert_eq!(builds.load(Ordering::SeqCst), expected);
    }
}

#[test]
fn singleton_survives_across_requests() {
    for injector in test_utils::injectors() {
        let builds = wire(&injector, Lifecycle::Singleton);

        let first = injector.get::<Root>().unwrap();
        let second = injector.get::<Root>().unwrap();

        assert!(!Arc::ptr_eq(&first.branch, &second.branch));
        assert!(Arc::ptr_eq(&first.leaf, &second.leaf));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn scoped_instances_are_fresh_per_request() {
    for injector in test_utils::injectors() {
        let builds = wire(&injector, Lifecycle::Scoped);

        let first = injector.get::<Root>().unwrap();
        let second = injector.get::<Root>().unwrap();

        assert!(Arc::ptr_eq(&first.leaf, &first.branch.right));
        assert!(!Arc::ptr_eq(&first.leaf, &second.leaf));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
    }
}

#[test]
fn direct_scoped_request_builds_once() {
    for injector in test_utils::injectors() {
        let builds = wire(&injector, Lifecycle::Scoped);

        let _leaf = injector.get::<Leaf>().unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}

#[test]
fn scope_spans_a_whole_call() {
    for injector in test_utils::injectors() {
        let builds = wire(&injector, Lifecycle::Scoped);

        let shared = injector
            .call1(|root: Arc<Root>, leaf: Arc<Leaf>| Arc::ptr_eq(&root.leaf, &leaf))
            .unwrap();

        assert!(shared);
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
