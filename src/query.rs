//! Queries: cached reads that provide tags.
//!
//! A [`Query`] describes how to turn an argument into an [`ApiRequest`], how to
//! decode the response, and which tags the cached result provides. Endpoint slices
//! declare their queries as [`QueryEndpoint`] values:
//!
//! ```rust
//! use storefront_provider::prelude::*;
//! use storefront_provider::api::cart::{self, Cart};
//!
//! async fn cart_badge(client: &QueryClient) -> usize {
//!     let mut cart = client.subscribe(cart::get_cart(), ());
//!     let state = cart.settled().await;
//!     state.data().map(Cart::item_count).unwrap_or(0)
//! }
//! ```

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::client::QueryClient;
use crate::envelope::decode_data;
use crate::errors::ApiResult;
use crate::state::QueryState;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;
use crate::types::{QueryArgBounds, QueryOutputBounds};

/// Builds the cache key of an endpoint call: `name(serialized-arg)`.
///
/// An argument JSON cannot represent (e.g. a map with non-string keys) falls back to
/// `name(#debug-repr)`, which never collides with a JSON key.
pub fn query_key<A: Serialize + std::fmt::Debug + ?Sized>(name: &str, arg: &A) -> String {
    match serde_json::to_string(arg) {
        Ok(serialized) => format!("{name}({serialized})"),
        Err(_error) => {
            crate::debug_log!("🔑 [CACHE-KEY] Debug form for {}: {}", name, _error);
            format!("{name}(#{arg:?})")
        }
    }
}

/// A cached read against the backend
pub trait Query: Clone + Send + Sync + 'static {
    /// Parameters (filters, pagination, ids)
    type Arg: QueryArgBounds;
    /// Decoded payload
    type Output: QueryOutputBounds;

    /// Endpoint name, the first half of the cache key
    fn name(&self) -> &'static str;

    /// Build the request for `arg`
    fn request(&self, arg: &Self::Arg) -> ApiResult<ApiRequest>;

    /// Tags the cached result provides. `output` is `None` when the fetch failed.
    fn provides(&self, arg: &Self::Arg, output: Option<&Self::Output>) -> Vec<Tag>;

    /// Decode a 2xx body
    fn decode(&self, body: Value) -> ApiResult<Self::Output> {
        decode_data(body)
    }

    /// Cache key for `arg`
    fn cache_key(&self, arg: &Self::Arg) -> String {
        query_key(self.name(), arg)
    }
}

/// How an endpoint derives tags from its argument and result
pub enum TagSpec<A, T> {
    /// No tags
    None,
    /// A fixed list of type tags
    Types(&'static [TagType]),
    /// Tags computed from the argument and (for queries) the result
    With(fn(&A, Option<&T>) -> Vec<Tag>),
}

impl<A, T> Clone for TagSpec<A, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, T> Copy for TagSpec<A, T> {}

impl<A, T> TagSpec<A, T> {
    pub fn resolve(&self, arg: &A, output: Option<&T>) -> Vec<Tag> {
        match self {
            TagSpec::None => Vec::new(),
            TagSpec::Types(kinds) => kinds.iter().copied().map(Tag::of).collect(),
            TagSpec::With(tags) => tags(arg, output),
        }
    }
}

/// A [`Query`] defined by a table of functions
pub struct QueryEndpoint<A, T> {
    name: &'static str,
    build: fn(&A) -> ApiResult<ApiRequest>,
    provides: TagSpec<A, T>,
    decode: fn(Value) -> ApiResult<T>,
}

impl<A, T> Clone for QueryEndpoint<A, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, T> Copy for QueryEndpoint<A, T> {}

impl<A, T> PartialEq for QueryEndpoint<A, T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<A, T> std::fmt::Debug for QueryEndpoint<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEndpoint").field("name", &self.name).finish()
    }
}

impl<A, T: DeserializeOwned> QueryEndpoint<A, T> {
    /// A query decoding its payload with [`decode_data`] and providing no tags
    pub fn new(name: &'static str, build: fn(&A) -> ApiResult<ApiRequest>) -> Self {
        Self {
            name,
            build,
            provides: TagSpec::None,
            decode: decode_data::<T>,
        }
    }
}

impl<A, T> QueryEndpoint<A, T> {
    /// Provide one type tag per listed kind
    pub fn provides_tags(mut self, kinds: &'static [TagType]) -> Self {
        self.provides = TagSpec::Types(kinds);
        self
    }

    /// Provide tags computed from the argument and result
    pub fn provides_with(mut self, tags: fn(&A, Option<&T>) -> Vec<Tag>) -> Self {
        self.provides = TagSpec::With(tags);
        self
    }

    /// Replace the response decoder
    pub fn decode_with(mut self, decode: fn(Value) -> ApiResult<T>) -> Self {
        self.decode = decode;
        self
    }
}

impl<A, T> Query for QueryEndpoint<A, T>
where
    A: QueryArgBounds,
    T: QueryOutputBounds,
{
    type Arg = A;
    type Output = T;

    fn name(&self) -> &'static str {
        self.name
    }

    fn request(&self, arg: &A) -> ApiResult<ApiRequest> {
        (self.build)(arg)
    }

    fn provides(&self, arg: &A, output: Option<&T>) -> Vec<Tag> {
        self.provides.resolve(arg, output)
    }

    fn decode(&self, body: Value) -> ApiResult<T> {
        (self.decode)(body)
    }
}

/// A live interest in one cache entry.
///
/// While held, invalidations of the entry's tags trigger a background refetch.
/// Dropping the handle releases the subscription; the data stays cached for the
/// retention window.
pub struct QuerySubscription<T> {
    client: QueryClient,
    key: String,
    entry: u64,
    receiver: watch::Receiver<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> QuerySubscription<T> {
    pub(crate) fn new(
        client: QueryClient,
        key: String,
        entry: u64,
        receiver: watch::Receiver<u64>,
    ) -> Self {
        Self {
            client,
            key,
            entry,
            receiver,
            _marker: PhantomData,
        }
    }

    /// The cache key this subscription holds
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Re-issue the fetch for this entry (the "Try Again" affordance)
    pub fn refetch(&self) -> bool {
        self.client.refetch(&self.key)
    }

    /// Wait for the next change of the entry. Returns `false` if the entry was removed.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }
}

impl<T: Clone + 'static> QuerySubscription<T> {
    /// Current snapshot of the entry
    pub fn state(&self) -> QueryState<T> {
        self.client.cache().read(&self.key)
    }

    /// Wait until the snapshot satisfies `predicate`, returning it.
    ///
    /// Returns the latest snapshot if the entry is removed while waiting.
    pub async fn wait_for(&mut self, predicate: impl Fn(&QueryState<T>) -> bool) -> QueryState<T> {
        loop {
            self.receiver.borrow_and_update();
            {
                let state = self.state();
                if predicate(&state) {
                    return state;
                }
            }
            if self.receiver.changed().await.is_err() {
                return self.state();
            }
        }
    }

    /// Wait until no request is in flight and a result (data or error) is available
    pub async fn settled(&mut self) -> QueryState<T> {
        self.wait_for(QueryState::is_settled).await
    }
}

impl<T> Drop for QuerySubscription<T> {
    fn drop(&mut self) {
        self.client.cache().unsubscribe(&self.key, self.entry);
    }
}

impl<T> std::fmt::Debug for QuerySubscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_key_serializes_argument() {
        assert_eq!(query_key("getCart", &()), "getCart(null)");
        assert_eq!(
            query_key("getOrderDetails", &"42".to_string()),
            "getOrderDetails(\"42\")"
        );
        assert_eq!(
            query_key("getProducts", &json!({ "page": 1 })),
            "getProducts({\"page\":1})"
        );
    }

    #[test]
    fn unserializable_arguments_keep_distinct_keys() {
        use std::collections::BTreeMap;

        let first = BTreeMap::from([((1, 2), "a")]);
        let second = BTreeMap::from([((3, 4), "a")]);
        let first_key = query_key("getReport", &first);
        let second_key = query_key("getReport", &second);
        assert_ne!(first_key, second_key);
        assert!(first_key.starts_with("getReport(#"));
        assert_eq!(first_key, query_key("getReport", &first));
    }

    #[test]
    fn endpoint_resolves_declared_tags() {
        let list: QueryEndpoint<(), Vec<u32>> =
            QueryEndpoint::new("getRoles", |_: &()| Ok(ApiRequest::get("/roles")))
                .provides_tags(&[TagType::Role]);
        assert_eq!(list.provides(&(), None), vec![Tag::of(TagType::Role)]);

        let detail: QueryEndpoint<String, u32> = QueryEndpoint::new("getRole", |id: &String| {
            Ok(ApiRequest::get(format!("/roles/{id}")))
        })
        .provides_with(|id: &String, _: Option<&u32>| vec![Tag::id(TagType::Role, id)]);
        assert_eq!(
            detail.provides(&"3".to_string(), Some(&1)),
            vec![Tag::id(TagType::Role, "3")]
        );
        assert_eq!(detail.request(&"3".to_string()).unwrap().path, "/roles/3");
    }
}
