use std::collections::HashMap;

use crate::error::LookupError;

/// String-keyed collection of live instances (rooms, areas, ...).
///
/// One instance per key. `insert` replaces whatever was there; `remove` of an unknown key does
/// nothing. Misses are reported two ways: [`Registry::get`] for callers that can shrug it off,
/// [`Registry::require`] for callers that can't.
#[derive(Clone, Debug)]
pub struct Registry<T> {
    kind: &'static str,
    items: HashMap<String, T>,
}

impl<T> Registry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the previous instance under `key`, if any.
    pub fn insert(&mut self, key: impl Into<String>, item: T) -> Option<T> {
        let key = key.into().trim().to_string();
        self.items.insert(key, item)
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.items.remove(key.trim())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key.trim())
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key.trim())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.items.get_mut(key.trim())
    }

    pub fn require(&self, key: &str) -> Result<&T, LookupError> {
        self.get(key).ok_or_else(|| self.not_found(key))
    }

    /// Keys in sorted order (stable output for listings).
    pub fn keys_sorted(&self) -> Vec<&str> {
        let mut v = self.items.keys().map(String::as_str).collect::<Vec<_>>();
        v.sort_unstable();
        v
    }

    fn not_found(&self, key: &str) -> LookupError {
        LookupError::NotFound {
            kind: self.kind,
            key: key.trim().to_string(),
        }
    }
}
