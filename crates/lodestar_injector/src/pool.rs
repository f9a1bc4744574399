//! Reusable scope-stack buffers.

use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::function::Instance;
use crate::key::TypeKey;

/// Default number of scoped instances a fresh stack can hold without growing.
pub const DEFAULT_SCOPE_CAPACITY: usize = 8;

/// The scoped instances built during one `get` or `call`.
#[derive(Default)]
pub struct ScopeStack {
    entries: Vec<(TypeKey, Instance)>,
}

impl ScopeStack {
    /// Creates an empty stack with room for `capacity` instances.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the instance already built for `key` in this scope.
    #[must_use]
    pub fn find(&self, key: &TypeKey) -> Option<Instance> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == key)
            .map(|(_, instance)| Arc::clone(instance))
    }

    /// Records the instance built for `key`.
    pub fn push(&mut self, key: TypeKey, instance: Instance) {
        self.entries.push((key, instance));
    }

    /// Drops every recorded instance, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of recorded instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of instances the stack holds without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }
}

/// A free-list of [`ScopeStack`] buffers.
///
/// Each top-level request checks out one stack and returns it, cleared, when
/// the [`PooledStack`] guard drops. Stacks are never shared between requests.
pub struct StackPool {
    free: Mutex<Vec<ScopeStack>>,
    capacity: usize,
}

impl StackPool {
    /// Creates a pool whose fresh stacks hold `capacity` instances.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
        }
    }

    /// Takes a stack from the pool, allocating one if none is free.
    pub fn check_out(&self) -> PooledStack<'_> {
        let stack = self.free.lock().pop().unwrap_or_else(|| {
            tracing::trace!(capacity = self.capacity, "allocating scope stack");
            ScopeStack::with_capacity(self.capacity)
        });
        PooledStack { pool: self, stack }
    }

    /// Returns the number of idle stacks.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn check_in(&self, mut stack: ScopeStack) {
        stack.clear();
        self.free.lock().push(stack);
    }
}

impl Default for StackPool {
    fn default() -> Self {
        Self::new(DEFAULT_SCOPE_CAPACITY)
    }
}

/// RAII guard for a checked-out [`ScopeStack`].
///
/// Dereferences to the stack; dropping the guard clears the stack and
/// returns it to its pool.
pub struct PooledStack<'a> {
    pool: &'a StackPool,
    stack: ScopeStack,
}

impl Deref for PooledStack<'_> {
    type Target = ScopeStack;

    fn deref(&self) -> &Self::Target {
        &self.stack
    }
}

impl DerefMut for PooledStack<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stack
    }
}

impl Drop for PooledStack<'_> {
    fn drop(&mut self) {
        self.pool.check_in(core::mem::take(&mut self.stack));
    }
}
