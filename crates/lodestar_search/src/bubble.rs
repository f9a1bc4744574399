//! Access-frequency promoting list.

use parking_lot::Mutex;

use crate::{All, Cache, Reorder};

struct BubbleEntry<K, V> {
    key: K,
    value: V,
    accesses: u64,
}

/// A vector that slowly sorts itself by access count.
///
/// Every promoted hit increments the entry's counter and swaps it one slot
/// toward the front when its counter now exceeds its left neighbour's. Over
/// time the most frequently requested keys collect at the front without ever
/// paying for a full re-sort. Good for access patterns that are stable for
/// the lifetime of the process.
pub struct BubbleList<K, V> {
    entries: Mutex<Vec<BubbleEntry<K, V>>>,
}

impl<K, V> Default for BubbleList<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<K, V> BubbleList<K, V> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: PartialEq, V> BubbleList<K, V> {
    /// Returns the keys in scan order.
    ///
    /// Exposed for diagnostics and tests; the order is an implementation
    /// detail of the promotion policy.
    #[must_use]
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }
}

impl<K, V> Cache<K, V> for BubbleList<K, V>
where
    K: PartialEq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn add(&self, key: K, value: V) {
        self.entries.lock().push(BubbleEntry {
            key,
            value,
            accesses: 0,
        });
    }

    fn find(&self, key: &K, reorder: Reorder) -> Option<V> {
        let mut entries = self.entries.lock();
        let index = entries.iter().position(|entry| entry.key == *key)?;
        let value = entries[index].value.clone();

        if reorder.is_promote() {
            entries[index].accesses += 1;
            if index > 0 && entries[index].accesses > entries[index - 1].accesses {
                entries.swap(index, index - 1);
            }
        }

        Some(value)
    }

    fn all(&self) -> All<K, V> {
        let entries = self.entries.lock();
        All::new(
            entries
                .iter()
                .map(|entry| (entry.key.clone(), entry.value.clone()))
                .collect(),
        )
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
