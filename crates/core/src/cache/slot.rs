//! Per-key cache entry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, Shared};
use tokio::time::Instant;

use super::state::{EntrySummary, QueryState, QueryStatus};
use crate::Error;

/// Longest wait before a failed entry may be fetched again by a passive read.
pub(crate) const FAILURE_BACKOFF: Duration = Duration::from_secs(5);

/// A fetch that any number of callers can await.
pub(crate) type SharedFetch<V> = Shared<BoxFuture<'static, Result<Arc<V>, Error>>>;

pub(crate) struct InFlight<V> {
    pub(crate) generation: u64,
    pub(crate) fetch: SharedFetch<V>,
}

/// One entry per distinct key.
///
/// `issued` is the generation of the most recently started request. Only a
/// result carrying that generation may be written back.
pub(crate) struct Slot<V> {
    pub(crate) status: QueryStatus,
    pub(crate) value: Option<Arc<V>>,
    pub(crate) error: Option<Error>,
    pub(crate) fetched_at: Option<Instant>,
    pub(crate) fetched_at_utc: Option<DateTime<Utc>>,
    pub(crate) failed_at: Option<Instant>,
    pub(crate) stale_after: Duration,
    pub(crate) issued: u64,
    pub(crate) in_flight: Option<InFlight<V>>,
    pub(crate) invalidated: bool,
}

impl<V> Slot<V> {
    pub(crate) fn new(stale_after: Duration) -> Self {
        Self {
            status: QueryStatus::Pending,
            value: None,
            error: None,
            fetched_at: None,
            fetched_at_utc: None,
            failed_at: None,
            stale_after,
            issued: 0,
            in_flight: None,
            invalidated: false,
        }
    }

    pub(crate) fn is_fresh(&self, now: Instant) -> bool {
        !self.invalidated
            && self.value.is_some()
            && self
                .fetched_at
                .is_some_and(|at| now.saturating_duration_since(at) < self.stale_after)
    }

    /// Whether a passive read should start a request: not fresh, nothing in
    /// flight, and any recent failure has backed off.
    pub(crate) fn wants_fetch(&self, now: Instant) -> bool {
        let backoff = self.stale_after.min(FAILURE_BACKOFF);
        !self.is_fresh(now)
            && self.in_flight.is_none()
            && self.failed_at.is_none_or(|at| now.saturating_duration_since(at) >= backoff)
    }

    /// Drop the failure so the next read refetches; a held value counts as ready again.
    pub(crate) fn forget_failure(&mut self) {
        self.error = None;
        self.failed_at = None;
        if self.value.is_some() {
            self.status = QueryStatus::Ready;
        }
    }

    pub(crate) fn state(&self, now: Instant) -> QueryState<V> {
        QueryState {
            status: self.status,
            value: self.value.clone(),
            error: self.error.clone(),
            is_fetching: self.in_flight.is_some(),
            is_stale: !self.is_fresh(now),
            fetched_at: self.fetched_at_utc,
        }
    }

    /// Record the result of the request with `generation`.
    ///
    /// Returns `false` when a newer request has been issued since, in which
    /// case the slot is left untouched.
    pub(crate) fn settle(&mut self, generation: u64, result: &Result<Arc<V>, Error>) -> bool {
        if generation != self.issued {
            return false;
        }

        self.in_flight = None;
        match result {
            Ok(value) => {
                self.value = Some(Arc::clone(value));
                self.error = None;
                self.status = QueryStatus::Ready;
                self.fetched_at = Some(Instant::now());
                self.fetched_at_utc = Some(Utc::now());
                self.failed_at = None;
                self.invalidated = false;
            }
            Err(err) => {
                self.error = Some(err.clone());
                self.failed_at = Some(Instant::now());
                self.status = QueryStatus::Error;
            }
        }
        true
    }

    pub(crate) fn summary<K>(&self, key: K, now: Instant) -> EntrySummary<K> {
        EntrySummary {
            key,
            status: self.status,
            has_value: self.value.is_some(),
            is_fetching: self.in_flight.is_some(),
            is_stale: !self.is_fresh(now),
            generation: self.issued,
            age: self.fetched_at.map(|at| now.saturating_duration_since(at)),
            stale_after: self.stale_after,
            fetched_at: self.fetched_at_utc,
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}
