//! Hash map strategy.

use core::hash::Hash;
use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::{All, Cache, Reorder};

/// Direct hash lookup.
///
/// Best for truly random access. Lookups take a shared read lock, so any
/// number of threads may resolve concurrently; [`Reorder`] has no effect.
pub struct MapCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for MapCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> MapCache<K, V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, V> Cache<K, V> for MapCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn add(&self, key: K, value: V) {
        self.entries.write().insert(key, value);
    }

    fn find(&self, key: &K, _reorder: Reorder) -> Option<V> {
        self.entries.read().get(key).cloned()
    }

    fn all(&self) -> All<K, V> {
        let entries = self.entries.read();
        All::new(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_find() {
        let map = MapCache::new();
        map.add(1_u32, "one");
        map.add(2_u32, "two");

        assert_eq!(map.find(&1, Reorder::Promote), Some("one"));
        assert_eq!(map.find(&2, Reorder::Preserve), Some("two"));
        assert_eq!(map.find(&3, Reorder::Promote), None);
    }

    #[test]
    fn add_overwrites_existing_key() {
        let map = MapCache::new();
        map.add("key", 1);
        map.add("key", 2);

        assert_eq!(map.len(), 1);
        assert_eq!(map.find(&"key", Reorder::Promote), Some(2));
    }

    #[test]
    fn all_yields_every_pair() {
        let map = MapCache::new();
        for index in 0..5 {
            map.add(index, index * 10);
        }

        let mut pairs: Vec<_> = map.all().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 0), (1, 10), (2, 20), (3, 30), (4, 40)]);
    }

    #[test]
    fn all_does_not_hold_lock_while_iterating() {
        let map = MapCache::new();
        map.add(1, 1);
        map.add(2, 2);

        for (key, _) in map.all() {
            map.add(key + 100, 0);
        }

        assert_eq!(map.len(), 4);
    }
}
