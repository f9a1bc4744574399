//! Short-name lookup for registered types.

use std::collections::BTreeMap;

use crate::key::TypeKey;

/// Maps short type names to keys.
///
/// The injector indexes every registered key under its
/// [`short_name`](TypeKey::short_name) and consults the index in
/// [`Injector::get_by_name`](crate::Injector::get_by_name).
pub trait NameIndex: Send + Sync {
    /// Indexes `key` under `name`.
    fn add(&mut self, name: &str, key: TypeKey);

    /// Finds the key indexed under `name`.
    fn find(&self, name: &str) -> Option<TypeKey>;
}

/// The default [`NameIndex`].
///
/// Names are reduced to their ASCII alphanumeric characters before being
/// stored or looked up, so `"Http_Client"` and `"HttpClient"` are the same
/// name. Lookups try an exact match first and fall back to a prefix match;
/// a name that matches more than one key finds nothing.
///
/// ```
/// use lodestar_injector::key::TypeKey;
/// use lodestar_injector::names::{NameIndex, PrefixIndex};
///
/// struct Database;
///
/// let mut index = PrefixIndex::new();
/// index.add("Database", TypeKey::of::<Database>());
///
/// assert_eq!(index.find("Database"), Some(TypeKey::of::<Database>()));
/// assert_eq!(index.find("Data"), Some(TypeKey::of::<Database>()));
/// assert_eq!(index.find("Cache"), None);
/// ```
#[derive(Debug, Default)]
pub struct PrefixIndex {
    entries: BTreeMap<String, Vec<TypeKey>>,
}

impl PrefixIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(name: &str) -> String {
        name.chars().filter(char::is_ascii_alphanumeric).collect()
    }
}

impl NameIndex for PrefixIndex {
    fn add(&mut self, name: &str, key: TypeKey) {
        let keys = self.entries.entry(Self::normalize(name)).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    fn find(&self, name: &str) -> Option<TypeKey> {
        let name = Self::normalize(name);
        if name.is_empty() {
            return None;
        }

        if let Some(keys) = self.entries.get(&name) {
            return match keys.as_slice() {
                [key] => Some(*key),
                _ => None,
            };
        }

        let mut matches = self
            .entries
            .range(name.clone()..)
            .take_while(|(candidate, _)| candidate.starts_with(&name))
            .flat_map(|(_, keys)| keys.iter().copied());
        let first = matches.next()?;
        matches.all(|key| key == first).then_some(first)
    }
}
