//! # Query cache and tag engine
//!
//! This module implements the process-wide, type-erased cache behind every query:
//! - **Entries** are keyed by `endpoint(serialized-arg)` and hold status, data, error,
//!   subscriber count and the tags they provide.
//! - **Tag invalidation** marks every entry providing a matching tag stale and hands back
//!   the refetchers of entries somebody is subscribed to. Unsubscribed entries refetch on
//!   their next subscription.
//! - **Generations** number every fetch; only the response of the latest fetch is applied.
//! - **Retention**: an entry whose subscriber count drops to zero keeps its data and
//!   becomes eligible for cleanup once idle longer than the retention window. LRU eviction
//!   bounds the number of idle entries.
//!
//! Callers never get a reference into the store; they read snapshots through
//! [`QueryCache::read`] and are notified through a per-entry version channel.

use std::{
    any::Any,
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use tokio::sync::watch;

use crate::client::QueryClient;
use crate::errors::ApiError;
use crate::state::{QueryState, QueryStatus};
use crate::tags::{Tag, TagRegistry};

/// Re-issues the fetch of one entry; captured at subscription time with the typed
/// query and argument.
pub(crate) type Refetcher = Arc<dyn Fn(&QueryClient, &str) + Send + Sync>;

/// Type-erased successful payload
pub(crate) type ErasedData = Arc<dyn Any + Send + Sync>;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// One fetch of one entry. An entry recreated under the same key gets a new id, so
/// tickets and subscriptions of the removed entry never touch its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    pub(crate) entry: u64,
    pub(crate) generation: u64,
}

/// Result of registering a subscriber
pub(crate) struct Subscribed {
    pub(crate) entry: u64,
    pub(crate) receiver: watch::Receiver<u64>,
    /// Set when the caller must issue a fetch
    pub(crate) fetch: Option<FetchTicket>,
}

/// What happened to a settling response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// The response was stored
    Applied,
    /// A newer fetch was issued for the entry; the response was dropped
    Superseded,
    /// The entry was removed while the request was in flight
    Evicted,
}

/// A cache entry for one `(endpoint, argument)` pair
pub struct CacheEntry {
    id: u64,
    endpoint: &'static str,
    status: QueryStatus,
    data: Option<ErasedData>,
    error: Option<ApiError>,
    subscribers: u32,
    generation: u64,
    in_flight: bool,
    invalidated_through: Option<u64>,
    created_at: Instant,
    fulfilled_at: Option<Instant>,
    last_accessed: Instant,
    idle_since: Option<Instant>,
    access_count: u32,
    version: watch::Sender<u64>,
    refetch: Refetcher,
}

impl CacheEntry {
    fn new(endpoint: &'static str, refetch: Refetcher) -> Self {
        let now = Instant::now();
        let (version, _) = watch::channel(0);
        Self {
            id: NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed),
            endpoint,
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            subscribers: 0,
            generation: 0,
            in_flight: false,
            invalidated_through: None,
            created_at: now,
            fulfilled_at: None,
            last_accessed: now,
            idle_since: Some(now),
            access_count: 0,
            version,
            refetch,
        }
    }

    /// Name of the endpoint this entry caches
    pub fn endpoint(&self) -> &'static str {
        self.endpoint
    }

    pub fn status(&self) -> QueryStatus {
        self.status
    }

    pub fn subscribers(&self) -> u32 {
        self.subscribers
    }

    /// Whether the entry was invalidated and has not been refetched since
    pub fn is_stale(&self) -> bool {
        matches!(self.invalidated_through, Some(through) if through >= self.settled_generation())
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Gets the current access count for the cache entry.
    pub fn access_count(&self) -> u32 {
        self.access_count
    }

    /// Gets the age of this cache entry.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the last successful fetch, if any
    pub fn time_since_fulfilled(&self) -> Option<Duration> {
        self.fulfilled_at.map(|at| at.elapsed())
    }

    /// Gets the time since this entry was last accessed.
    pub fn time_since_last_access(&self) -> Duration {
        self.last_accessed.elapsed()
    }

    /// Checks if the entry has had no subscriber for at least `duration`.
    pub fn is_unused_for(&self, duration: Duration) -> bool {
        self.subscribers == 0 && self.idle_since.is_some_and(|since| since.elapsed() >= duration)
    }

    fn settled_generation(&self) -> u64 {
        if self.in_flight {
            self.generation.saturating_sub(1)
        } else {
            self.generation
        }
    }

    fn needs_fetch(&self) -> bool {
        if self.in_flight {
            return false;
        }
        match self.status {
            QueryStatus::Uninitialized | QueryStatus::Error => true,
            QueryStatus::Loading => false,
            QueryStatus::Success => self.is_stale(),
        }
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.in_flight = true;
        self.status = QueryStatus::Loading;
        self.notify();
        FetchTicket {
            entry: self.id,
            generation: self.generation,
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
        self.access_count = self.access_count.saturating_add(1);
    }

    fn notify(&self) {
        self.version.send_modify(|version| *version += 1);
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    tags: TagRegistry,
}

impl CacheInner {
    fn remove(&mut self, key: &str) -> bool {
        self.tags.remove_entry(key);
        self.entries.remove(key).is_some()
    }
}

/// Process-wide query cache shared by every subscription of a client
#[derive(Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl QueryCache {
    /// Creates a new, empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a subscriber for `key`, creating the entry on first use.
    ///
    /// Returns the entry's id and change channel and, when the caller must issue a
    /// fetch, the ticket of that fetch. A fetch already in flight is shared.
    pub(crate) fn subscribe(
        &self,
        key: &str,
        endpoint: &'static str,
        refetch: impl FnOnce() -> Refetcher,
    ) -> Subscribed {
        let mut inner = self.lock();
        let entry = inner
            .entries
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry::new(endpoint, refetch()));
        entry.subscribers += 1;
        entry.idle_since = None;
        entry.touch();

        let fetch = if entry.needs_fetch() {
            Some(entry.begin_fetch())
        } else {
            if entry.in_flight {
                crate::debug_log!("🔄 [REQUEST-DEDUP] Request already pending for key: {}", key);
            } else {
                crate::log_cache_hit!("{} ({} subscribers)", key, entry.subscribers);
            }
            None
        };
        Subscribed {
            entry: entry.id,
            receiver: entry.version.subscribe(),
            fetch,
        }
    }

    /// Drops one subscriber of entry `entry_id` at `key`; at zero the entry starts its
    /// idle period. Does nothing if the entry was removed, even if `key` has since been
    /// recreated.
    pub(crate) fn unsubscribe(&self, key: &str, entry_id: u64) {
        let mut inner = self.lock();
        if let Some(entry) = inner
            .entries
            .get_mut(key)
            .filter(|entry| entry.id == entry_id)
        {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                entry.idle_since = Some(Instant::now());
            }
        }
    }

    /// Starts a new fetch generation for an existing entry
    pub(crate) fn begin_fetch(&self, key: &str) -> Option<FetchTicket> {
        let mut inner = self.lock();
        inner.entries.get_mut(key).map(CacheEntry::begin_fetch)
    }

    /// Applies the outcome of fetch `ticket` unless a newer fetch superseded it.
    ///
    /// Tags are recorded for both successes and failures so an errored entry can be
    /// revived by invalidation.
    pub(crate) fn settle(
        &self,
        key: &str,
        ticket: FetchTicket,
        result: Result<ErasedData, ApiError>,
        tags: Vec<Tag>,
    ) -> SettleOutcome {
        let mut inner = self.lock();
        let CacheInner { entries, tags: registry } = &mut *inner;
        let Some(entry) = entries.get_mut(key).filter(|entry| entry.id == ticket.entry) else {
            return SettleOutcome::Evicted;
        };
        if entry.generation != ticket.generation {
            return SettleOutcome::Superseded;
        }

        entry.in_flight = false;
        match result {
            Ok(data) => {
                entry.status = QueryStatus::Success;
                entry.data = Some(data);
                entry.error = None;
                entry.fulfilled_at = Some(Instant::now());
            }
            Err(error) => {
                entry.status = QueryStatus::Error;
                entry.error = Some(error);
            }
        }
        registry.provide_tags(key, &tags);
        entry.notify();
        SettleOutcome::Applied
    }

    /// Reads a snapshot of `key` as `T`.
    ///
    /// Updates the entry's access time and count. A missing entry reads as uninitialized.
    pub fn read<T: Clone + 'static>(&self, key: &str) -> QueryState<T> {
        let mut inner = self.lock();
        let Some(entry) = inner.entries.get_mut(key) else {
            return QueryState::uninitialized();
        };
        entry.touch();
        QueryState {
            status: entry.status,
            data: entry
                .data
                .as_ref()
                .and_then(|data| data.downcast_ref::<T>())
                .cloned(),
            error: entry.error.clone(),
            is_fetching: entry.in_flight,
            is_stale: entry.is_stale(),
        }
    }

    /// Marks every entry providing a tag matched by `tags` stale.
    ///
    /// Returns the number of entries marked and the refetchers of those with at least
    /// one subscriber.
    pub(crate) fn invalidate(&self, tags: &[Tag]) -> (usize, Vec<(String, Refetcher)>) {
        let mut inner = self.lock();
        let keys = inner.tags.keys_for(tags);
        let mut refetch = Vec::new();
        let mut marked = 0;
        for key in keys {
            let Some(entry) = inner.entries.get_mut(&key) else {
                continue;
            };
            entry.invalidated_through = Some(entry.generation);
            entry.notify();
            marked += 1;
            if entry.subscribers > 0 {
                refetch.push((key, entry.refetch.clone()));
            } else {
                crate::debug_log!("⏸️ [CACHE-INVALIDATE] Deferred refetch for idle key: {}", key);
            }
        }
        (marked, refetch)
    }

    /// The refetcher of `key`, if the entry exists
    pub(crate) fn refetcher(&self, key: &str) -> Option<Refetcher> {
        self.lock().entries.get(key).map(|entry| entry.refetch.clone())
    }

    /// Whether an entry exists for `key`
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn subscriber_count(&self, key: &str) -> u32 {
        self.lock()
            .entries
            .get(key)
            .map(CacheEntry::subscribers)
            .unwrap_or(0)
    }

    /// The tags the entry at `key` currently provides
    pub fn tags_of(&self, key: &str) -> Vec<Tag> {
        self.lock().tags.tags_of(key).to_vec()
    }

    /// Keys of all cached entries
    pub fn keys(&self) -> Vec<String> {
        self.lock().entries.keys().cloned().collect()
    }

    /// Removes an entry regardless of subscribers.
    ///
    /// Live subscriptions of the removed entry are detached: their change channel
    /// closes, and releasing them leaves any entry later created under `key` untouched.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    /// Clears all cached data.
    ///
    /// In-flight responses for cleared entries are discarded when they settle, and live
    /// subscriptions are detached as with [`remove`](Self::remove).
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.tags.clear();
        crate::log_cache_invalidate!("Cleared all cache entries");
    }

    /// Gets the number of cached entries.
    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    /// Cleans up entries that have had no subscriber for longer than `unused_threshold`.
    ///
    /// # Returns
    ///
    /// The number of entries removed.
    pub fn cleanup_unused_entries(&self, unused_threshold: Duration) -> usize {
        let mut inner = self.lock();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_unused_for(unused_threshold))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            crate::debug_log!("🧹 [CACHE-CLEANUP] Removing unused entry: {}", key);
            inner.remove(key);
        }
        if !expired.is_empty() {
            crate::debug_log!("🧹 [CACHE-CLEANUP] Removed {} unused entries", expired.len());
        }
        expired.len()
    }

    /// Evicts least recently used idle entries until at most `max_size` entries remain.
    ///
    /// Entries with subscribers are never evicted, so the cache may stay above
    /// `max_size` while they are held.
    ///
    /// # Returns
    ///
    /// The number of entries evicted.
    pub fn evict_lru_entries(&self, max_size: usize) -> usize {
        let mut inner = self.lock();
        if inner.entries.len() <= max_size {
            return 0;
        }

        let mut idle: Vec<(String, Duration)> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.subscribers == 0)
            .map(|(key, entry)| (key.clone(), entry.time_since_last_access()))
            .collect();
        // Oldest access first
        idle.sort_by(|(_, a), (_, b)| b.cmp(a));

        let excess = inner.entries.len() - max_size;
        let mut evicted = 0;
        for (key, _) in idle.into_iter().take(excess) {
            inner.remove(&key);
            evicted += 1;
        }
        if evicted > 0 {
            crate::debug_log!(
                "🗑️ [LRU-EVICT] Evicted {} entries due to cache size limit",
                evicted
            );
        }
        evicted
    }

    /// Performs a full maintenance pass: idle cleanup, then LRU eviction.
    pub fn maintain(&self, unused_threshold: Duration, max_size: usize) -> CacheMaintenanceStats {
        CacheMaintenanceStats {
            unused_removed: self.cleanup_unused_entries(unused_threshold),
            lru_evicted: self.evict_lru_entries(max_size),
            final_size: self.size(),
        }
    }

    /// Gets cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = CacheStats {
            entry_count: inner.entries.len(),
            ..CacheStats::default()
        };
        let mut total_age = Duration::ZERO;
        for entry in inner.entries.values() {
            total_age += entry.age();
            stats.total_accesses += entry.access_count();
            stats.total_subscribers += entry.subscribers;
            if entry.subscribers == 0 {
                stats.idle_entries += 1;
            }
            if entry.in_flight {
                stats.in_flight += 1;
            }
            if entry.is_stale() {
                stats.stale_entries += 1;
            }
        }
        if stats.entry_count > 0 {
            stats.avg_age = total_age / stats.entry_count as u32;
        }
        stats
    }
}

/// Statistics for cache maintenance operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMaintenanceStats {
    pub unused_removed: usize,
    pub lru_evicted: usize,
    pub final_size: usize,
}

/// General cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub idle_entries: usize,
    pub stale_entries: usize,
    pub in_flight: usize,
    pub total_accesses: u32,
    pub total_subscribers: u32,
    pub avg_age: Duration,
}

impl CacheStats {
    pub fn avg_accesses_per_entry(&self) -> f64 {
        if self.entry_count > 0 {
            self.total_accesses as f64 / self.entry_count as f64
        } else {
            0.0
        }
    }
}
