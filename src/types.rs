//! Common types and aliases used throughout storefront-provider

use serde::{Serialize, de::DeserializeOwned};

/// Common trait bounds for query and mutation arguments
///
/// Arguments are serialized into the cache key, so they must be `Serialize`.
pub trait QueryArgBounds: Clone + Serialize + std::fmt::Debug + Send + Sync + 'static {}
impl<T> QueryArgBounds for T where T: Clone + Serialize + std::fmt::Debug + Send + Sync + 'static {}

/// Common trait bounds for decoded endpoint output types
pub trait QueryOutputBounds: Clone + DeserializeOwned + Send + Sync + 'static {}
impl<T> QueryOutputBounds for T where T: Clone + DeserializeOwned + Send + Sync + 'static {}

/// Field name to value map backing a form
pub type FormData = std::collections::BTreeMap<String, String>;

/// Field name to error message map; an empty string means "no error"
pub type FieldErrors = std::collections::BTreeMap<String, String>;
