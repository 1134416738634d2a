// File: src/cache/ttl_cache.rs

use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::models::AutocompleteChoice;

/// Process-local key -> value map whose entries expire after a fixed TTL.
///
/// Expiry uses `tokio::time::Instant`, so paused-clock tests can step past it.
pub struct TtlCache<K, V> {
    entries: DashMap<K, (V, Instant)>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a live entry. An expired entry is dropped on the way out.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if *expires_at > now {
                return Some(value.clone());
            }
        }
        self.entries.remove_if(key, |_, (_, expires_at)| *expires_at <= now);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.insert(key, (value, Instant::now() + self.ttl));
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `(command, option, input)`; names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AutocompleteKey {
    pub command: String,
    pub option: String,
    pub input: String,
}

impl AutocompleteKey {
    pub fn new(command: &str, option: &str, input: &str) -> Self {
        Self {
            command: command.to_lowercase(),
            option: option.to_lowercase(),
            input: input.to_string(),
        }
    }
}

pub type AutocompleteCache = TtlCache<AutocompleteKey, Vec<AutocompleteChoice>>;
