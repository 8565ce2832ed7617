//! Read-side views of cache entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Lifecycle of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// No successful result yet; a request is (or is about to be) in flight.
    Pending,
    /// The last request for this key succeeded.
    Ready,
    /// The last request for this key failed. A previous value may still be present.
    Error,
}

/// Snapshot of one query as seen by a reader.
///
/// `value` is the last successfully fetched result, kept even when a later
/// refetch failed (`status == Error`) or is still running (`is_fetching`).
#[derive(Debug)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub value: Option<Arc<V>>,
    pub error: Option<Error>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            value: self.value.clone(),
            error: self.error.clone(),
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            fetched_at: self.fetched_at,
        }
    }
}

impl<V> QueryState<V> {
    /// A query that has been requested but has nothing to show yet.
    pub fn pending() -> Self {
        Self {
            status: QueryStatus::Pending,
            value: None,
            error: None,
            is_fetching: true,
            is_stale: true,
            fetched_at: None,
        }
    }

    /// A query that failed before it was ever sent (e.g. rejected input).
    pub fn failed(error: Error) -> Self {
        Self {
            status: QueryStatus::Error,
            value: None,
            error: Some(error),
            is_fetching: false,
            is_stale: true,
            fetched_at: None,
        }
    }

    /// A result that was delivered to a waiting caller but is not held by the cache.
    pub(crate) fn detached(value: Arc<V>) -> Self {
        Self {
            status: QueryStatus::Ready,
            value: Some(value),
            error: None,
            is_fetching: false,
            is_stale: true,
            fetched_at: Some(Utc::now()),
        }
    }

    /// Nothing to show and still waiting for the first result.
    pub fn is_loading(&self) -> bool {
        self.value.is_none() && self.status == QueryStatus::Pending
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_deref()
    }

    /// Project the value, keeping status and flags.
    pub fn map<U>(self, f: impl FnOnce(&V) -> U) -> QueryState<U> {
        QueryState {
            status: self.status,
            value: self.value.as_deref().map(|v| Arc::new(f(v))),
            error: self.error,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            fetched_at: self.fetched_at,
        }
    }

    /// Settled value or the recorded error; loading counts as an error.
    pub fn into_result(self) -> Result<Arc<V>, Error> {
        match (self.value, self.error) {
            (Some(value), _) => Ok(value),
            (None, Some(err)) => Err(err),
            (None, None) => Err(Error::Network("request did not settle".into())),
        }
    }
}

/// Diagnostic summary of one cache entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary<K> {
    pub key: K,
    pub status: QueryStatus,
    pub has_value: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
    /// Latest request generation issued for this key.
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Duration>,
    pub stale_after: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
