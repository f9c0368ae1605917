//! In-memory state stores for stateful operators.
//!
//! Stores are byte-keyed and byte-valued; typed access happens through the
//! codec boundary at read time. [`InMemoryStore`] is the only backend: runs
//! are short-lived and single-threaded, so there is nothing to persist and
//! nothing to synchronize.

use std::collections::BTreeMap;
use std::ops::Bound;

use bytes::Bytes;

/// Compute the lexicographic successor of a byte prefix.
///
/// Returns `None` if no successor exists (empty prefix or all bytes are
/// 0xFF). Used by `BTreeMap::range()` to bound prefix scans.
fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    if prefix.is_empty() {
        return None;
    }
    let mut successor = prefix.to_vec();
    while let Some(last) = successor.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(successor);
        }
        successor.pop();
    }
    None
}

/// Trait for state store implementations.
///
/// Stores are `Send` but not `Sync`: each flow owns its stores for the
/// duration of one run and drops them with it.
pub trait StateStore: Send {
    /// Point lookup. Returns `None` when the key is absent.
    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Inserts a key-value pair, overwriting any existing value.
    fn put(&mut self, key: &[u8], value: &[u8]);

    /// Removes a key. Absent keys are ignored.
    fn delete(&mut self, key: &[u8]);

    /// All entries whose key starts with `prefix`, in lexicographic order.
    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Bytes)>;

    /// Full contents in lexicographic key order.
    fn snapshot(&self) -> BTreeMap<Vec<u8>, Bytes>;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Returns true when the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// BTreeMap-backed store with ordered iteration and prefix scans.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    entries: BTreeMap<Vec<u8>, Bytes>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryStore {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &[u8], value: &[u8]) {
        self.entries
            .insert(key.to_vec(), Bytes::copy_from_slice(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Bytes)> {
        let lower = Bound::Included(prefix.to_vec());
        let upper = match prefix_successor(prefix) {
            Some(successor) => Bound::Excluded(successor),
            None => Bound::Unbounded,
        };
        self.entries
            .range((lower, upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn snapshot(&self) -> BTreeMap<Vec<u8>, Bytes> {
        self.entries.clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
