//! Injector construction options.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use lodestar_search::{BubbleList, Cache, MapCache, PriorityList};

use crate::key::TypeKey;
use crate::names::{NameIndex, PrefixIndex};
use crate::pool::DEFAULT_SCOPE_CAPACITY;
use crate::record::ObjectRecord;

/// The lookup strategy backing the type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheStrategy {
    /// Hash map with concurrent readers.
    #[default]
    Map,
    /// Vector that promotes frequently resolved types.
    BubbleList,
    /// Linked list that moves the last resolved type to the front.
    PriorityList,
}

impl CacheStrategy {
    /// Every available strategy.
    pub const ALL: [Self; 3] = [Self::Map, Self::BubbleList, Self::PriorityList];

    pub(crate) fn build(self) -> Box<dyn Cache<TypeKey, Arc<ObjectRecord>>> {
        match self {
            Self::Map => Box::new(MapCache::new()),
            Self::BubbleList => Box::new(BubbleList::new()),
            Self::PriorityList => Box::new(PriorityList::new()),
        }
    }

    /// Returns the strategy's configuration name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::BubbleList => "bubble-list",
            Self::PriorityList => "priority-list",
        }
    }
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`CacheStrategy`] name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache strategy '{0}', expected one of: map, bubble-list, priority-list")]
pub struct ParseStrategyError(String);

impl FromStr for CacheStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "map" => Ok(Self::Map),
            "bubble-list" | "bubble_list" | "bubble" => Ok(Self::BubbleList),
            "priority-list" | "priority_list" | "priority" => Ok(Self::PriorityList),
            _ => Err(ParseStrategyError(s.to_owned())),
        }
    }
}

/// Builder for [`Injector`](crate::Injector) construction options.
///
/// # Example
///
/// ```
/// use lodestar_injector::{CacheStrategy, Injector, InjectorConfig};
///
/// let config = InjectorConfig::new()
///     .with_strategy(CacheStrategy::PriorityList)
///     .with_scope_capacity(32);
/// let injector = Injector::with_config(config);
///
/// // The injector always registers itself.
/// assert_eq!(injector.len(), 1);
/// ```
pub struct InjectorConfig {
    pub(crate) strategy: CacheStrategy,
    pub(crate) scope_capacity: usize,
    pub(crate) name_index: Box<dyn NameIndex>,
}

impl InjectorConfig {
    /// Creates the default configuration: map strategy, scope capacity 8 and
    /// a [`PrefixIndex`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategy: CacheStrategy::default(),
            scope_capacity: DEFAULT_SCOPE_CAPACITY,
            name_index: Box::new(PrefixIndex::new()),
        }
    }

    /// Sets the registry lookup strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: CacheStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the initial capacity of freshly allocated scope stacks.
    #[must_use]
    pub fn with_scope_capacity(mut self, capacity: usize) -> Self {
        self.scope_capacity = capacity;
        self
    }

    /// Replaces the short-name index.
    #[must_use]
    pub fn with_name_index(mut self, index: impl NameIndex + 'static) -> Self {
        self.name_index = Box::new(index);
        self
    }

    /// Returns the configured strategy.
    #[must_use]
    pub fn strategy(&self) -> CacheStrategy {
        self.strategy
    }

    /// Returns the configured scope capacity.
    #[must_use]
    pub fn scope_capacity(&self) -> usize {
        self.scope_capacity
    }
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InjectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectorConfig")
            .field("strategy", &self.strategy)
            .field("scope_capacity", &self.scope_capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_round_trip_through_display() {
        for strategy in CacheStrategy::ALL {
            assert_eq!(strategy.to_string().parse::<CacheStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn strategy_parsing_is_lenient_about_case_and_separators() {
        assert_eq!(" Map ".parse::<CacheStrategy>(), Ok(CacheStrategy::Map));
        assert_eq!("PRIORITY_LIST".parse::<CacheStrategy>(), Ok(CacheStrategy::PriorityList));
        assert_eq!("bubble".parse::<CacheStrategy>(), Ok(CacheStrategy::BubbleList));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let error = "btree".parse::<CacheStrategy>().unwrap_err();
        assert!(error.to_string().contains("btree"));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = InjectorConfig::default();
        assert_eq!(config.strategy(), CacheStrategy::Map);
        assert_eq!(config.scope_capacity(), DEFAULT_SCOPE_CAPACITY);

        let config = config
            .with_strategy(CacheStrategy::BubbleList)
            .with_scope_capacity(2);
        assert_eq!(config.strategy(), CacheStrategy::BubbleList);
        assert_eq!(config.scope_capacity(), 2);
    }
}
