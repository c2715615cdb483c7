//! # Query client
//!
//! [`QueryClient`] owns the transport and the shared [`QueryCache`]. It issues fetches
//! for subscribed queries, applies their results through the cache's generation check,
//! runs mutations and fans their invalidations out to the affected entries.
//!
//! Fetches run as background tasks on the ambient tokio runtime. Observers wait on
//! their [`QuerySubscription`] rather than on the fetch itself. Without a runtime a
//! fetch is not started and its entry settles with [`ApiError::Fetch`].

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::cache::{
    CacheMaintenanceStats, ErasedData, FetchTicket, QueryCache, Refetcher, SettleOutcome,
};
use crate::config::ClientConfig;
use crate::errors::{ApiError, ApiResult};
use crate::mutation::{Mutation, MutationHandle};
use crate::query::{Query, QuerySubscription};
use crate::tags::Tag;
use crate::transport::{HttpTransport, Transport};

struct ClientInner {
    transport: Arc<dyn Transport>,
    cache: QueryCache,
    config: ClientConfig,
}

/// Shared handle to the transport and query cache. Cloning is cheap.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("base_url", &self.inner.config.base_url)
            .field("entries", &self.inner.cache.size())
            .finish()
    }
}

impl QueryClient {
    /// A client talking HTTP to `config.base_url`
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// A client over a custom transport
    pub fn with_transport(config: ClientConfig, transport: impl Transport) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport: Arc::new(transport),
                cache: QueryCache::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.inner.cache
    }

    pub fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    /// Subscribe to `query(arg)`.
    ///
    /// The first subscriber of an uninitialized, failed or stale entry starts a fetch;
    /// later subscribers share the entry and any fetch in flight.
    pub fn subscribe<Q: Query>(&self, query: Q, arg: Q::Arg) -> QuerySubscription<Q::Output> {
        let key = query.cache_key(&arg);
        let subscribed = self.inner.cache.subscribe(&key, query.name(), || {
            let query = query.clone();
            let arg = arg.clone();
            let refetch: Refetcher = Arc::new(move |client: &QueryClient, key: &str| {
                if let Some(ticket) = client.cache().begin_fetch(key) {
                    client.spawn_fetch(query.clone(), arg.clone(), key.to_string(), ticket);
                }
            });
            refetch
        });
        if let Some(ticket) = subscribed.fetch {
            self.spawn_fetch(query, arg, key.clone(), ticket);
        }
        QuerySubscription::new(self.clone(), key, subscribed.entry, subscribed.receiver)
    }

    /// Fetch `query(arg)` through the cache and wait for the result.
    ///
    /// Served from cache when the entry is fresh.
    pub async fn fetch<Q: Query>(&self, query: Q, arg: Q::Arg) -> ApiResult<Q::Output> {
        let mut subscription = self.subscribe(query, arg);
        let state = subscription.settled().await;
        state
            .to_result()
            .unwrap_or_else(|| Err(ApiError::Fetch("query entry was removed".to_string())))
    }

    /// Re-issue the fetch of the entry at `key`. Returns `false` if no such entry exists.
    pub fn refetch(&self, key: &str) -> bool {
        match self.inner.cache.refetcher(key) {
            Some(refetch) => {
                refetch(self, key);
                true
            }
            None => false,
        }
    }

    fn spawn_fetch<Q: Query>(&self, query: Q, arg: Q::Arg, key: String, ticket: FetchTicket) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            crate::warn_log!("No async runtime available to fetch {}", key);
            let error = ApiError::Fetch("no async runtime available".to_string());
            let tags = query.provides(&arg, None);
            self.inner.cache.settle(&key, ticket, Err(error), tags);
            return;
        };

        let client = self.clone();
        handle.spawn(async move {
            let result = client.run_query(&query, &arg).await;
            let tags = query.provides(&arg, result.as_ref().ok());
            let erased = result.map(|data| Arc::new(data) as ErasedData);
            match client.inner.cache.settle(&key, ticket, erased, tags) {
                SettleOutcome::Applied => {
                    crate::log_cache_store!("{} (generation {})", key, ticket.generation);
                }
                SettleOutcome::Superseded => {
                    crate::log_stale_response!("{} (generation {})", key, ticket.generation);
                }
                SettleOutcome::Evicted => {
                    crate::debug_log!("🗑️ [CACHE-STORE] Entry removed before response: {}", key);
                }
            }
        });
    }

    async fn run_query<Q: Query>(&self, query: &Q, arg: &Q::Arg) -> ApiResult<Q::Output> {
        let request = query.request(arg)?;
        let body = self.inner.transport.send(request).await?;
        query.decode(body)
    }

    /// Send `mutation(arg)`; on success invalidate the tags it names.
    pub async fn mutate<M: Mutation>(&self, mutation: &M, arg: M::Arg) -> ApiResult<M::Output> {
        crate::log_mutation_start!("{}", mutation.name());
        let result = async {
            let request = mutation.request(&arg)?;
            let body = self.inner.transport.send(request).await?;
            mutation.decode(body)
        }
        .await;

        match &result {
            Ok(output) => {
                crate::log_mutation_success!("{}", mutation.name());
                let tags = mutation.invalidates(&arg, output);
                self.invalidate_tags(&tags);
            }
            Err(error) => {
                crate::log_mutation_error!("{}: {}", mutation.name(), error);
            }
        }
        result
    }

    /// Bind `mutation` to this client, tracking the state of its calls
    pub fn mutation<M: Mutation>(&self, mutation: M) -> MutationHandle<M> {
        MutationHandle::new(self.clone(), mutation)
    }

    /// Mark every entry providing a tag matched by `tags` stale, refetching those
    /// with subscribers. Returns the number of entries marked.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let (marked, refetch) = self.inner.cache.invalidate(tags);
        crate::log_cache_invalidate!(
            "{} entries for [{}], refetching {}",
            marked,
            tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(", "),
            refetch.len()
        );
        for (key, refetcher) in refetch {
            refetcher(self, &key);
        }
        marked
    }

    /// Run one maintenance pass with the configured retention window and size limit
    pub fn collect_garbage(&self) -> CacheMaintenanceStats {
        let config = &self.inner.config;
        self.inner
            .cache
            .maintain(config.keep_unused_for, config.max_cache_entries)
    }

    /// Run [`collect_garbage`](Self::collect_garbage) every `maintenance_interval`
    /// on the current tokio runtime until the returned handle is aborted.
    pub fn spawn_maintenance(&self) -> JoinHandle<()> {
        let client = self.clone();
        let period = self.inner.config.maintenance_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let stats = client.collect_garbage();
                if stats.unused_removed > 0 || stats.lru_evicted > 0 {
                    crate::debug_log!(
                        "🔧 [MAINTENANCE] Removed {} unused, evicted {}, {} entries remain",
                        stats.unused_removed,
                        stats.lru_evicted,
                        stats.final_size
                    );
                }
            }
        })
    }

    /// Drop every cached entry (e.g. on logout)
    pub fn reset(&self) {
        self.inner.cache.clear();
    }
}
