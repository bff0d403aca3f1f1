use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Occurrence counts that remember the order keys were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn add(&mut self, key: impl Into<String>) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map(|&pos| self.entries[pos].1).unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Highest count first; equal counts keep first-seen order.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> =
            self.entries.iter().map(|(k, n)| (k.as_str(), *n)).collect();
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out
    }

    pub fn top(&self, n: usize) -> Vec<(&str, usize)> {
        let mut out = self.most_common();
        out.truncate(n);
        out
    }
}

impl<S: Into<String>> FromIterator<S> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = Self::default();
        for key in iter {
            table.add(key);
        }
        table
    }
}

/// Serialized as a flat `key -> count` object in most-common order.
impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ranked = self.most_common();
        let mut map = serializer.serialize_map(Some(ranked.len()))?;
        for (key, count) in ranked {
            map.serialize_entry(key, &count)?;
        }
        map.end()
    }
}
