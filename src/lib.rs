#![doc = include_str!("../README.md")]

#[cfg(target_family = "wasm")]
compile_error!(
    "storefront-provider runs fetches on tokio and its reqwest transport; wasm targets are not supported"
);

// Core modules
pub mod cache;
pub mod client;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod global;
mod log_utils;
pub mod mutation;
pub mod query;
pub mod state;
pub mod tags;
pub mod transport;
pub mod types;

// Endpoint slices and storefront features
pub mod api;
pub mod checkout;
pub mod export;
pub mod validation;

#[cfg(feature = "hooks")]
pub mod hooks;

// Re-export commonly used items at crate root for convenience
pub use client::QueryClient;
pub use config::ClientConfig;
pub use global::init;

pub mod prelude {
    //! The prelude exports the most common types and functions of storefront-provider.

    // Client, queries and mutations
    pub use crate::client::QueryClient;
    pub use crate::mutation::{Mutation, MutationEndpoint, MutationHandle};
    pub use crate::query::{Query, QueryEndpoint, QuerySubscription, query_key};

    // State types, needed for matching
    pub use crate::state::{AsyncState, MutationState, QueryState, QueryStatus};

    // Tags
    pub use crate::tags::{Tag, TagType};

    // Configuration and global initialization
    pub use crate::config::ClientConfig;
    pub use crate::global::{get_global_client, init, init_with_transport, is_initialized};

    // Error types
    pub use crate::errors::{ApiError, ApiResult, ErrorKind};

    // Forms
    pub use crate::validation::{FormSchema, FormState};

    #[cfg(feature = "hooks")]
    pub use crate::hooks::{
        UseMutation, use_invalidate_tags, use_mutation, use_query, use_query_client, use_refetch,
    };
}
