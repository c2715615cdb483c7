//! Dioxus hooks binding queries and mutations to component state.
//!
//! ```rust,no_run
//! use dioxus::prelude::*;
//! use storefront_provider::api::cart::{self, AddToCart};
//! use storefront_provider::prelude::*;
//!
//! #[component]
//! fn CartBadge() -> Element {
//!     let cart = use_query(cart::get_cart(), ());
//!     let count = cart.read().data().map(|cart| cart.item_count()).unwrap_or(0);
//!     rsx! { span { "{count}" } }
//! }
//!
//! #[component]
//! fn AddButton(product_id: String) -> Element {
//!     let add = use_mutation(cart::add_to_cart());
//!     let loading = add.state().read().is_loading();
//!     rsx! {
//!         button {
//!             disabled: loading,
//!             onclick: move |_| add.trigger(AddToCart { product_id: product_id.clone(), quantity: 1 }),
//!             "Add to cart"
//!         }
//!     }
//! }
//! ```

use dioxus::prelude::*;
use dioxus::core::Task;

use crate::client::QueryClient;
use crate::errors::ApiResult;
use crate::global::get_global_client;
use crate::mutation::Mutation;
use crate::query::Query;
use crate::state::{MutationState, QueryState};
use crate::tags::Tag;

/// The client provided through context, else the global one.
///
/// # Panics
///
/// When neither a context client nor a global client (see [`crate::global::init`]) exists.
pub fn use_query_client() -> QueryClient {
    if let Some(client) = try_consume_context::<QueryClient>() {
        return client;
    }
    get_global_client().cloned().unwrap_or_else(|_| {
        panic!("Global client not initialized. Call storefront_provider::global::init() before using query hooks.")
    })
}

/// Subscribe the component to `query(arg)`.
///
/// The subscription lives as long as the component. A changed argument drops the
/// old subscription and takes a new one.
pub fn use_query<Q>(query: Q, arg: Q::Arg) -> Signal<QueryState<Q::Output>>
where
    Q: Query + PartialEq,
    Q::Arg: PartialEq,
{
    let client = use_query_client();
    let mut state = use_signal(QueryState::<Q::Output>::default);
    let mut task = use_signal(|| None::<Task>);

    use_effect(use_reactive!(|(query, arg)| {
        if let Some(previous) = task.write().take() {
            previous.cancel();
        }
        let mut subscription = client.subscribe(query, arg);
        crate::debug_log!("🔗 [HOOK] Subscribed to {}", subscription.key());
        state.set(subscription.state());
        let handle = spawn(async move {
            while subscription.changed().await {
                state.set(subscription.state());
            }
        });
        task.set(Some(handle));
    }));

    state
}

/// A "Try Again" action re-issuing `query(arg)`
pub fn use_refetch<Q: Query>(query: Q, arg: Q::Arg) -> impl Fn() + Clone {
    let client = use_query_client();
    let key = query.cache_key(&arg);
    move || {
        client.refetch(&key);
    }
}

/// Invalidate tags by hand, e.g. after a server-sent event
pub fn use_invalidate_tags() -> impl Fn(&[Tag]) + Clone {
    let client = use_query_client();
    move |tags: &[Tag]| {
        client.invalidate_tags(tags);
    }
}

/// A mutation bound to the component
pub struct UseMutation<M: Mutation> {
    client: QueryClient,
    mutation: M,
    state: Signal<MutationState<M::Output>>,
}

impl<M: Mutation> Clone for UseMutation<M> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            mutation: self.mutation.clone(),
            state: self.state,
        }
    }
}

impl<M: Mutation> UseMutation<M> {
    /// State of the latest call, for loading affordances and toasts
    pub fn state(&self) -> Signal<MutationState<M::Output>> {
        self.state
    }

    /// Fire the mutation from an event handler
    pub fn trigger(&self, arg: M::Arg) {
        let this = self.clone();
        spawn(async move {
            let _ = this.trigger_async(arg).await;
        });
    }

    /// Send the mutation and wait for its outcome
    pub async fn trigger_async(&self, arg: M::Arg) -> ApiResult<M::Output> {
        let mut state = self.state;
        state.set(MutationState::Loading);
        let result = self.client.mutate(&self.mutation, arg).await;
        state.set(MutationState::from(result.clone()));
        result
    }

    pub fn reset(&self) {
        let mut state = self.state;
        state.set(MutationState::Idle);
    }
}

pub fn use_mutation<M: Mutation>(mutation: M) -> UseMutation<M> {
    let client = use_query_client();
    let state = use_signal(|| MutationState::<M::Output>::Idle);
    use_hook(|| UseMutation {
        client,
        mutation,
        state,
    })
}
