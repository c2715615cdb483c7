//! State: async state types for storefront-provider
//!
//! This module provides [`QueryState`], [`MutationState`] and the [`AsyncState`]
//! trait shared by both.

use crate::errors::ApiError;

/// Common trait for async state types that represent loading, success, and error states
///
/// This trait provides a unified interface for working with the different async state
/// types in storefront-provider, such as `QueryState` and `MutationState`.
pub trait AsyncState {
    /// The type of successful data
    type Data;

    /// Returns true if the state is currently loading
    fn is_loading(&self) -> bool;

    /// Returns true if the state contains successful data
    fn is_success(&self) -> bool;

    /// Returns true if the state contains an error
    fn is_error(&self) -> bool;

    /// Returns the data if available, None otherwise
    fn data(&self) -> Option<&Self::Data>;

    /// Returns the error if failed, None otherwise
    fn error(&self) -> Option<&ApiError>;
}

/// Lifecycle of a cache entry: `Uninitialized → Loading → (Success | Error)`,
/// and back to `Loading` on every refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryStatus {
    #[default]
    Uninitialized,
    Loading,
    Success,
    Error,
}

/// Snapshot of a query as seen by one subscriber
///
/// `data` keeps the last successful payload while a refetch is in flight or after a
/// failed refetch, so views can keep rendering it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    /// A request for this entry is in flight
    pub is_fetching: bool,
    /// The entry was invalidated and not yet refetched
    pub is_stale: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: false,
        }
    }
}

impl<T> AsyncState for QueryState<T> {
    type Data = T;

    fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }
}

impl<T> QueryState<T> {
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn is_uninitialized(&self) -> bool {
        self.status == QueryStatus::Uninitialized
    }

    /// Loading with nothing to show yet (first load, as opposed to a refetch)
    pub fn is_initial_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    /// Neither uninitialized nor waiting on a request
    pub fn is_settled(&self) -> bool {
        !self.is_fetching && matches!(self.status, QueryStatus::Success | QueryStatus::Error)
    }

    /// Returns true if the state is currently loading
    pub fn is_loading(&self) -> bool {
        <Self as AsyncState>::is_loading(self)
    }

    /// Returns true if the state contains successful data
    pub fn is_success(&self) -> bool {
        <Self as AsyncState>::is_success(self)
    }

    /// Returns true if the state contains an error
    pub fn is_error(&self) -> bool {
        <Self as AsyncState>::is_error(self)
    }

    /// Returns the data if available, None otherwise
    pub fn data(&self) -> Option<&T> {
        <Self as AsyncState>::data(self)
    }

    /// Returns the error if failed, None otherwise
    pub fn error(&self) -> Option<&ApiError> {
        <Self as AsyncState>::error(self)
    }

    /// Converts a settled state into a `Result`; `None` while nothing has settled yet.
    pub fn to_result(&self) -> Option<Result<T, ApiError>>
    where
        T: Clone,
    {
        match self.status {
            QueryStatus::Success => self.data.clone().map(Ok),
            QueryStatus::Error => self.error.clone().map(Err),
            _ => None,
        }
    }

    /// Maps a QueryState<T> to QueryState<U> by applying a function to the contained data.
    pub fn map<U, F>(self, op: F) -> QueryState<U>
    where
        F: FnOnce(T) -> U,
    {
        QueryState {
            status: self.status,
            data: self.data.map(op),
            error: self.error,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
        }
    }
}

/// State of a mutation call, bound to a UI loading affordance
#[derive(Debug, Clone, PartialEq)]
pub enum MutationState<T> {
    /// The mutation has not been triggered (or was reset)
    Idle,
    /// The request is in flight
    Loading,
    /// The backend confirmed the mutation
    Success(T),
    /// The mutation failed
    Error(ApiError),
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        MutationState::Idle
    }
}

impl<T> AsyncState for MutationState<T> {
    type Data = T;

    fn is_loading(&self) -> bool {
        matches!(self, MutationState::Loading)
    }

    fn is_success(&self) -> bool {
        matches!(self, MutationState::Success(_))
    }

    fn is_error(&self) -> bool {
        matches!(self, MutationState::Error(_))
    }

    fn data(&self) -> Option<&T> {
        match self {
            MutationState::Success(data) => Some(data),
            _ => None,
        }
    }

    fn error(&self) -> Option<&ApiError> {
        match self {
            MutationState::Error(error) => Some(error),
            _ => None,
        }
    }
}

impl<T> MutationState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, MutationState::Idle)
    }

    /// Returns true if the request is in flight
    pub fn is_loading(&self) -> bool {
        <Self as AsyncState>::is_loading(self)
    }

    /// Returns true if the backend confirmed the mutation
    pub fn is_success(&self) -> bool {
        <Self as AsyncState>::is_success(self)
    }

    /// Returns true if the mutation failed
    pub fn is_error(&self) -> bool {
        <Self as AsyncState>::is_error(self)
    }
}

impl<T> From<Result<T, ApiError>> for MutationState<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => MutationState::Success(data),
            Err(error) => MutationState::Error(error),
        }
    }
}
