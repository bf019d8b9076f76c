//! Bounded translation cache
//!
//! Entries are keyed by model identity, response options and input text.
//! A capacity of zero disables caching entirely.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use serde::Serialize;

use crate::engine::{Response, ResponseOptions};
use crate::model::ModelId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model: ModelId,
    options: ResponseOptions,
    text: String,
}

/// Counters describing cache effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

/// LRU cache of engine responses
pub struct TranslationCache {
    entries: Option<LruCache<CacheKey, Arc<Response>>>,
    stats: CacheStats,
}

impl TranslationCache {
    /// Create a cache holding at most `capacity` responses
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.as_ref().map_or(0, |c| c.cap().get())
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Fetch a cached response, marking it as recently used
    pub fn get(
        &mut self,
        model: ModelId,
        options: ResponseOptions,
        text: &str,
    ) -> Option<Arc<Response>> {
        let entries = self.entries.as_mut()?;
        let key = CacheKey {
            model,
            options,
            text: text.to_string(),
        };

        match entries.get(&key) {
            Some(response) => {
                self.stats.hits += 1;
                Some(Arc::clone(response))
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store the response to `text`, evicting the least recently used entry when full
    pub fn insert(
        &mut self,
        model: ModelId,
        options: ResponseOptions,
        text: &str,
        response: Arc<Response>,
    ) {
        let Some(entries) = self.entries.as_mut() else {
            return;
        };
        let key = CacheKey {
            model,
            options,
            text: text.to_string(),
        };

        // push also hands back the previous value when the key was present
        let replacing = entries.contains(&key);
        if entries.push(key, response).is_some() && !replacing {
            self.stats.evictions += 1;
        }
        self.stats.insertions += 1;
    }

    /// Drop every entry produced by `model`
    pub fn purge_model(&mut self, model: ModelId) -> usize {
        let Some(entries) = self.entries.as_mut() else {
            return 0;
        };
        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| key.model == model)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    pub fn clear(&mut self) {
        if let Some(entries) = self.entries.as_mut() {
            entries.clear();
        }
    }
}
