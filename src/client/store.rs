/*!
 * Response Store
 * Process-wide GET response cache with TTL-aware lookups
 */

use super::key::CacheKey;
use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// One cached response
///
/// Entries are replaced wholesale, never patched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<Value>,
    pub fetched_at: Instant,
    pub ttl: Duration,
    ticket: u64,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// A zero TTL is never fresh
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.age(now) < self.ttl
    }
}

/// Result of a TTL-aware lookup
#[derive(Debug, Clone)]
pub enum Lookup {
    Fresh(Arc<Value>),
    Stale(Arc<Value>),
    Missing,
}

/// Concurrent response store
///
/// Every network fetch draws a ticket when it is issued. A completed fetch
/// replaces the entry only if no later-issued fetch has already written it,
/// and a fetch issued before an invalidation covering its key is not stored.
/// Invalidations are tracked per key, per removed prefix, and store-wide for
/// `clear`.
pub struct CacheStore {
    entries: DashMap<CacheKey, CacheEntry, RandomState>,
    revalidating: DashSet<CacheKey, RandomState>,
    next_ticket: AtomicU64,
    /// Store-wide cutoff set by `clear`
    invalidated_through: AtomicU64,
    /// Cutoffs of single-key removals
    key_cutoffs: DashMap<CacheKey, u64, RandomState>,
    /// Cutoffs of prefix removals, one per prefix
    prefix_cutoffs: RwLock<Vec<(String, u64)>>,
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    revalidations: AtomicU64,
    revalidation_failures: AtomicU64,
}

impl CacheStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            revalidating: DashSet::with_hasher(RandomState::new()),
            next_ticket: AtomicU64::new(0),
            invalidated_through: AtomicU64::new(0),
            key_cutoffs: DashMap::with_hasher(RandomState::new()),
            prefix_cutoffs: RwLock::new(Vec::new()),
            hits: AtomicU64::new(0),
            stale_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            revalidations: AtomicU64::new(0),
            revalidation_failures: AtomicU64::new(0),
        }
    }

    /// TTL-aware lookup, counted in the stats
    pub fn lookup(&self, key: &CacheKey, now: Instant) -> Lookup {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Lookup::Fresh(entry.payload.clone())
            }
            Some(entry) => {
                self.stale_hits.fetch_add(1, Ordering::Relaxed);
                Lookup::Stale(entry.payload.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Lookup::Missing
            }
        }
    }

    /// Payload regardless of freshness, without touching the stats
    pub fn peek(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.entries.get(key).map(|entry| entry.payload.clone())
    }

    pub fn entry(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Ticket for a fetch about to be issued
    pub fn ticket(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Store a fetched payload; returns whether it was written
    pub fn commit(
        &self,
        key: CacheKey,
        ticket: u64,
        payload: Arc<Value>,
        ttl: Duration,
        fetched_at: Instant,
    ) -> bool {
        let entry = CacheEntry {
            payload,
            fetched_at,
            ttl,
            ticket,
        };

        // Cutoffs are checked under the shard lock so a concurrent removal
        // either sees this write or is seen by it
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().ticket > ticket || self.is_invalidated(occupied.key(), ticket) {
                    return false;
                }
                occupied.insert(entry);
                true
            }
            Entry::Vacant(vacant) => {
                if self.is_invalidated(vacant.key(), ticket) {
                    return false;
                }
                vacant.insert(entry);
                true
            }
        }
    }

    /// Whether a fetch with `ticket` was issued before an invalidation of `key`
    fn is_invalidated(&self, key: &CacheKey, ticket: u64) -> bool {
        if ticket <= self.invalidated_through.load(Ordering::SeqCst) {
            return true;
        }
        if self
            .key_cutoffs
            .get(key)
            .is_some_and(|cutoff| ticket <= *cutoff)
        {
            return true;
        }
        self.prefix_cutoffs
            .read()
            .iter()
            .any(|(prefix, cutoff)| ticket <= *cutoff && key.is_under(prefix))
    }

    fn issued(&self) -> u64 {
        self.next_ticket.load(Ordering::SeqCst)
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        let issued = self.issued();
        self.key_cutoffs
            .entry(key.clone())
            .and_modify(|cutoff| *cutoff = (*cutoff).max(issued))
            .or_insert(issued);
        self.entries.remove(key).is_some()
    }

    /// Remove every entry whose path lies under `prefix`
    pub fn remove_under(&self, prefix: &str) -> usize {
        let issued = self.issued();
        {
            let mut cutoffs = self.prefix_cutoffs.write();
            match cutoffs.iter_mut().find(|(p, _)| p == prefix) {
                Some((_, cutoff)) => *cutoff = (*cutoff).max(issued),
                None => cutoffs.push((prefix.to_string(), issued)),
            }
        }
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.is_under(prefix));
        before.saturating_sub(self.entries.len())
    }

    /// Remove everything; narrower cutoffs are subsumed
    pub fn clear(&self) {
        let issued = self.issued();
        self.invalidated_through.fetch_max(issued, Ordering::SeqCst);
        self.key_cutoffs.retain(|_, cutoff| *cutoff > issued);
        self.prefix_cutoffs.write().retain(|(_, cutoff)| *cutoff > issued);
        self.entries.clear();
    }

    /// Claim the background refresh slot for a key
    pub fn begin_revalidation(&self, key: &CacheKey) -> bool {
        let claimed = self.revalidating.insert(key.clone());
        if claimed {
            self.revalidations.fetch_add(1, Ordering::Relaxed);
        }
        claimed
    }

    pub fn end_revalidation(&self, key: &CacheKey, succeeded: bool) {
        self.revalidating.remove(key);
        if !succeeded {
            self.revalidation_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn is_revalidating(&self, key: &CacheKey) -> bool {
        self.revalidating.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let stale_hits = self.stale_hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + stale_hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            size: self.entries.len(),
            hits,
            stale_hits,
            misses,
            revalidations: self.revalidations.load(Ordering::Relaxed),
            revalidation_failures: self.revalidation_failures.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub stale_hits: u64,
    pub misses: u64,
    pub revalidations: u64,
    /// Background refreshes that failed or whose payload was not stored
    pub revalidation_failures: u64,
    /// Fresh hits as a percentage of all lookups
    pub hit_rate: f64,
}
