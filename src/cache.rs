//! Process-lifetime memoization keyed on call arguments.
//!
//! Repeated aggregation or fetch calls with identical parameters short-circuit
//! to the previously computed result instead of re-hitting the network. There
//! is no invalidation policy beyond process lifetime (feed data changes on
//! the order of minutes, slower than an interactive session), but [`MemoCache::clear`]
//! exists so tests and long-lived callers can reset explicitly.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Mutex;

/// Hash the exact argument tuple of a memoized call.
pub fn arg_key<K: Hash>(args: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    args.hash(&mut hasher);
    hasher.finish()
}

/// A clone-on-read cache from argument hash to result.
#[derive(Default)]
pub struct MemoCache<V: Clone> {
    map: Mutex<HashMap<u64, V>>,
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        MemoCache {
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: u64) -> Option<V> {
        self.map.lock().ok()?.get(&key).cloned()
    }

    pub fn insert(&self, key: u64, value: V) {
        if let Ok(mut map) = self.map.lock() {
            map.insert(key, value);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut map) = self.map.lock() {
            map.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_clear() {
        let cache: MemoCache<Vec<String>> = MemoCache::new();
        let key = arg_key(&(vec!["inflasi".to_string()], 60usize));
        assert!(cache.get(key).is_none());

        cache.insert(key, vec!["hasil".to_string()]);
        assert_eq!(cache.get(key), Some(vec!["hasil".to_string()]));

        cache.clear();
        assert!(cache.get(key).is_none());
    }

    #[test]
    fn test_distinct_args_distinct_keys() {
        let a = arg_key(&(vec!["inflasi".to_string()], 60usize));
        let b = arg_key(&(vec!["inflasi".to_string()], 80usize));
        assert_ne!(a, b);
    }
}
