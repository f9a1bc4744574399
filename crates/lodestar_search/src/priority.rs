//! Most-recently-used linked list.

use parking_lot::Mutex;

use crate::{All, Cache, Reorder};

struct Node<K, V> {
    key: K,
    value: V,
    next: Link<K, V>,
}

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Chain<K, V> {
    head: Link<K, V>,
    len: usize,
}

impl<K, V> Drop for Chain<K, V> {
    fn drop(&mut self) {
        // Unlink iteratively so long chains don't recurse on drop.
        let mut current = self.head.take();
        while let Some(mut node) = current {
            current = node.next.take();
        }
    }
}

/// A singly linked list that moves every promoted hit to the head.
///
/// Favours temporal locality: whatever was resolved last is found first.
/// Cheap for small registries whose hot set drifts over time. New entries
/// are pushed at the head.
pub struct PriorityList<K, V> {
    chain: Mutex<Chain<K, V>>,
}

impl<K, V> Default for PriorityList<K, V> {
    fn default() -> Self {
        Self {
            chain: Mutex::new(Chain { head: None, len: 0 }),
        }
    }
}

impl<K, V> PriorityList<K, V> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the keys in scan order.
    #[must_use]
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let chain = self.chain.lock();
        let mut keys = Vec::with_capacity(chain.len);
        let mut current = chain.head.as_deref();
        while let Some(node) = current {
            keys.push(node.key.clone());
            current = node.next.as_deref();
        }
        keys
    }
}

impl<K: PartialEq, V: Clone> Chain<K, V> {
    /// Returns the position and value of the first node holding `key`.
    fn locate(&self, key: &K) -> Option<(usize, V)> {
        let mut current = self.head.as_deref();
        let mut position = 0;
        while let Some(node) = current {
            if node.key == *key {
                return Some((position, node.value.clone()));
            }
            position += 1;
            current = node.next.as_deref();
        }
        None
    }

    /// Unlinks the node at `position` and relinks it at the head.
    fn promote(&mut self, position: usize) {
        if position == 0 {
            return;
        }

        let detached = {
            let mut predecessor = self.head.as_deref_mut();
            for _ in 1..position {
                predecessor = predecessor.and_then(|node| node.next.as_deref_mut());
            }
            predecessor.and_then(|node| {
                let mut target = node.next.take()?;
                node.next = target.next.take();
                Some(target)
            })
        };

        if let Some(mut node) = detached {
            node.next = self.head.take();
            self.head = Some(node);
        }
    }
}

impl<K, V> Cache<K, V> for PriorityList<K, V>
where
    K: PartialEq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn add(&self, key: K, value: V) {
        let mut chain = self.chain.lock();
        let next = chain.head.take();
        chain.head = Some(Box::new(Node { key, value, next }));
        chain.len += 1;
    }

    fn find(&self, key: &K, reorder: Reorder) -> Option<V> {
        let mut chain = self.chain.lock();
        let (position, value) = chain.locate(key)?;
        if reorder.is_promote() {
            chain.promote(position);
        }
        Some(value)
    }

    fn all(&self) -> All<K, V> {
        let chain = self.chain.lock();
        let mut entries = Vec::with_capacity(chain.len);
        let mut current = chain.head.as_deref();
        while let Some(node) = current {
            entries.push((node.key.clone(), node.value.clone()));
            current = node.next.as_deref();
        }
        All::new(entries)
    }

    fn len(&self) -> usize {
        self.chain.lock().len
    }
}
