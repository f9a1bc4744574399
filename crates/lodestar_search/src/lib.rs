//! Pluggable lookup strategies for the Lodestar type registry.
//!
//! The injector stores one record per registered type and looks records up on
//! every resolution. How that lookup is performed is a construction-time
//! choice between interchangeable [`Cache`] strategies:
//!
//! | Strategy | Structure | Promotion on hit |
//! |----------|-----------|------------------|
//! | [`MapCache`] | Hash map | None |
//! | [`BubbleList`] | Vector | Swap one slot forward once hit more often than the left neighbour |
//! | [`PriorityList`] | Singly linked list | Move to the head |
//!
//! All strategies return the same values for the same sequence of calls; they
//! differ only in lookup latency under different access patterns.
//!
//! # Example
//!
//! ```
//! use lodestar_search::{Cache, PriorityList, Reorder};
//!
//! let cache = PriorityList::new();
//! cache.add("config", 1);
//! cache.add("logger", 2);
//!
//! assert_eq!(cache.find(&"config", Reorder::Promote), Some(1));
//! assert_eq!(cache.find(&"missing", Reorder::Promote), None);
//! ```

mod bubble;
mod map;
mod priority;

pub use bubble::BubbleList;
pub use map::MapCache;
pub use priority::PriorityList;

/// Whether a lookup may relocate the matched entry.
///
/// Verification walks the registry with [`Reorder::Preserve`] so that it does
/// not perturb the ordering state accumulated by ordinary resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Reorder {
    /// The strategy may promote the hit to favour future lookups.
    #[default]
    Promote,
    /// The strategy must leave its ordering state untouched.
    Preserve,
}

impl Reorder {
    /// Returns `true` if the lookup may promote its hit.
    #[must_use]
    pub fn is_promote(self) -> bool {
        matches!(self, Self::Promote)
    }
}

/// A thread-safe key-to-value store with a strategy-defined lookup order.
///
/// # Contract
///
/// - [`add`](Self::add) inserts unconditionally. Callers are responsible for
///   rejecting duplicate keys; list strategies keep both entries and return
///   the first one found.
/// - [`find`](Self::find) never changes the *result* of a concurrent `find`,
///   only the order in which entries are scanned.
/// - [`all`](Self::all) yields a snapshot of every pair, so callers may issue
///   nested lookups while iterating.
pub trait Cache<K, V>: Send + Sync {
    /// Inserts a key-value pair.
    fn add(&self, key: K, value: V);

    /// Looks up the value stored for `key`.
    fn find(&self, key: &K, reorder: Reorder) -> Option<V>;

    /// Returns a one-shot iterator over every stored pair.
    fn all(&self) -> All<K, V>;

    /// Hook invoked before a whole-registry pass.
    ///
    /// Reserved for strategies that need to materialize state before being
    /// iterated; all provided strategies treat it as a no-op.
    fn prepare(&self) {}

    /// Returns the number of stored entries.
    fn len(&self) -> usize;

    /// Returns `true` if nothing has been stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Snapshot iterator returned by [`Cache::all`].
pub struct All<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> All<K, V> {
    pub(crate) fn new(entries: Vec<(K, V)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl<K, V> Iterator for All<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for All<K, V> {}
