//! Mutations: writes that invalidate tags.
//!
//! A [`Mutation`] sends one request and, once the backend confirms it, invalidates the
//! tags it names. A failed mutation invalidates nothing. The tags may depend on the
//! argument (e.g. `{Order, id}` for a status change), and the result.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::client::QueryClient;
use crate::envelope::decode_data;
use crate::errors::ApiResult;
use crate::query::TagSpec;
use crate::state::MutationState;
use crate::tags::{Tag, TagType};
use crate::transport::ApiRequest;
use crate::types::{QueryArgBounds, QueryOutputBounds};

/// A write against the backend
pub trait Mutation: Clone + Send + Sync + 'static {
    type Arg: QueryArgBounds;
    type Output: QueryOutputBounds;

    /// Endpoint name, used in logs
    fn name(&self) -> &'static str;

    /// Build the request for `arg`
    fn request(&self, arg: &Self::Arg) -> ApiResult<ApiRequest>;

    /// Tags to invalidate after a confirmed success
    fn invalidates(&self, arg: &Self::Arg, output: &Self::Output) -> Vec<Tag>;

    /// Decode a 2xx body
    fn decode(&self, body: Value) -> ApiResult<Self::Output> {
        decode_data(body)
    }
}

/// A [`Mutation`] defined by a table of functions
pub struct MutationEndpoint<A, T> {
    name: &'static str,
    build: fn(&A) -> ApiResult<ApiRequest>,
    invalidates: TagSpec<A, T>,
    decode: fn(Value) -> ApiResult<T>,
}

impl<A, T> Clone for MutationEndpoint<A, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, T> Copy for MutationEndpoint<A, T> {}

impl<A, T> PartialEq for MutationEndpoint<A, T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<A, T> std::fmt::Debug for MutationEndpoint<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationEndpoint")
            .field("name", &self.name)
            .finish()
    }
}

impl<A, T: DeserializeOwned> MutationEndpoint<A, T> {
    pub fn new(name: &'static str, build: fn(&A) -> ApiResult<ApiRequest>) -> Self {
        Self {
            name,
            build,
            invalidates: TagSpec::None,
            decode: decode_data::<T>,
        }
    }
}

impl<A, T> MutationEndpoint<A, T> {
    /// Invalidate one type tag per listed kind
    pub fn invalidates_tags(mut self, kinds: &'static [TagType]) -> Self {
        self.invalidates = TagSpec::Types(kinds);
        self
    }

    /// Invalidate tags computed from the argument and result
    pub fn invalidates_with(mut self, tags: fn(&A, Option<&T>) -> Vec<Tag>) -> Self {
        self.invalidates = TagSpec::With(tags);
        self
    }

    pub fn decode_with(mut self, decode: fn(Value) -> ApiResult<T>) -> Self {
        self.decode = decode;
        self
    }
}

impl<A, T> Mutation for MutationEndpoint<A, T>
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

    fn invalidates(&self, arg: &A, output: &T) -> Vec<Tag> {
        self.invalidates.resolve(arg, Some(output))
    }

    fn decode(&self, body: Value) -> ApiResult<T> {
        (self.decode)(body)
    }
}

/// A mutation bound to a client, tracking the state of its latest call
pub struct MutationHandle<M: Mutation> {
    client: QueryClient,
    mutation: M,
    state: Arc<watch::Sender<MutationState<M::Output>>>,
}

impl<M: Mutation> Clone for MutationHandle<M> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            mutation: self.mutation.clone(),
            state: self.state.clone(),
        }
    }
}

impl<M: Mutation> MutationHandle<M> {
    pub(crate) fn new(client: QueryClient, mutation: M) -> Self {
        let (state, _) = watch::channel(MutationState::Idle);
        Self {
            client,
            mutation,
            state: Arc::new(state),
        }
    }

    /// Send the mutation, moving the state through `Loading` to its outcome
    pub async fn trigger(&self, arg: M::Arg) -> ApiResult<M::Output> {
        self.state.send_replace(MutationState::Loading);
        let result = self.client.mutate(&self.mutation, arg).await;
        self.state.send_replace(MutationState::from(result.clone()));
        result
    }

    /// The state of the latest call
    pub fn state(&self) -> MutationState<M::Output> {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Watch state changes
    pub fn subscribe(&self) -> watch::Receiver<MutationState<M::Output>> {
        self.state.subscribe()
    }

    /// Return to `Idle`
    pub fn reset(&self) {
        self.state.send_replace(MutationState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_tags_use_argument_and_result() {
        let update: MutationEndpoint<(String, String), Value> =
            MutationEndpoint::new("updateOrderStatus", |(id, _): &(String, String)| {
                Ok(ApiRequest::put(format!("/orders/{id}/status")))
            })
            .invalidates_with(|(id, _): &(String, String), _: Option<&Value>| {
                vec![Tag::of(TagType::Order), Tag::id(TagType::Order, id)]
            });

        let arg = ("7".to_string(), "shipped".to_string());
        assert_eq!(
            update.invalidates(&arg, &Value::Null),
            vec![Tag::of(TagType::Order), Tag::id(TagType::Order, "7")]
        );
        assert_eq!(update.request(&arg).unwrap().path, "/orders/7/status");
    }
}
