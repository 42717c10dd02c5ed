//! Short-lived cache of list responses.
//!
//! Entries are keyed by resource, forwarded query string and caller, and a
//! write against a resource type drops every cached list of that type.
//!
//! Each resource carries a generation that every invalidation bumps. A list
//! fetch captures the generation before it goes to the backend and the entry
//! it stores is only served while that generation is still current, so a
//! fetch that overlaps a write can never repopulate the cache with pre-write
//! data.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde_json::Value;

use crate::models::Resource;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    resource: Resource,
    query: String,
    // hashed, tokens are not kept in memory longer than the request
    caller: u64,
}

struct CachedList {
    body: Value,
    stored_at: Instant,
    generation: u64,
}

pub struct ListCache {
    ttl: Duration,
    entries: DashMap<CacheKey, CachedList>,
    generations: DashMap<Resource, u64>,
}

impl ListCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: DashMap::new(), generations: DashMap::new() }
    }

    /// Current generation of `resource`. Capture it before fetching a list.
    pub fn generation(&self, resource: Resource) -> u64 {
        self.generations.get(&resource).map(|g| *g).unwrap_or(0)
    }

    fn is_fresh(&self, entry: &CachedList, generation: u64) -> bool {
        entry.generation == generation && entry.stored_at.elapsed() < self.ttl
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn key(resource: Resource, query: Option<&str>, token: Option<&str>) -> CacheKey {
        let mut hasher = DefaultHasher::new();
        token.hash(&mut hasher);
        CacheKey { resource, query: query.unwrap_or_default().to_string(), caller: hasher.finish() }
    }

    pub fn get(&self, resource: Resource, query: Option<&str>, token: Option<&str>) -> Option<Value> {
        if !self.is_enabled() {
            return None;
        }
        let key = Self::key(resource, query, token);
        let generation = self.generation(resource);
        let fresh = self
            .entries
            .get(&key)
            .filter(|entry| self.is_fresh(entry, generation))
            .map(|entry| entry.body.clone());

        if fresh.is_none() {
            // a concurrent put may have replaced the entry since the read
            self.entries.remove_if(&key, |_, entry| !self.is_fresh(entry, generation));
        }
        fresh
    }

    /// Store a list fetched under `generation`. Dropped when the resource has
    /// been invalidated since.
    pub fn put(
        &self,
        resource: Resource,
        query: Option<&str>,
        token: Option<&str>,
        generation: u64,
        body: Value,
    ) {
        if !self.is_enabled() {
            return;
        }
        if self.generation(resource) != generation {
            tracing::debug!("Discarding {:?} list fetched before a write", resource);
            return;
        }
        self.entries.insert(
            Self::key(resource, query, token),
            CachedList { body, stored_at: Instant::now(), generation },
        );
    }

    /// Drop every cached list of `resource`.
    pub fn invalidate(&self, resource: Resource) {
        *self.generations.entry(resource).or_insert(0) += 1;
        self.entries.retain(|key, _| key.resource != resource);
        tracing::debug!("Invalidated cached {:?} lists", resource);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
