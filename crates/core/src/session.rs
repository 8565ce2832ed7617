//! Interactive browse session: filter state, debounced search, and the view.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::Error;
use crate::catalogue::Catalogue;
use crate::debounce::{Debouncer, Stabilized};
use crate::engine::FilterState;
use crate::query::{QueryKey, SortField, SortOrder};
use crate::view::{self, BrowseOptions, Scope, ViewState};

/// Why [`BrowseSession::changed`] woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The debounced search term was applied.
    Search,
    /// A query the view depends on settled or was invalidated.
    Data,
    /// The session can no longer change (its inputs are gone).
    Closed,
}

/// Debounced search text tagged with its input sequence number.
type Typed = (u64, String);

enum Wake {
    Term(Option<Typed>),
    Event(Result<QueryKey, RecvError>),
}

/// One operator's browse screen over a shared [`Catalogue`].
///
/// Typed search text goes through a debouncer; everything else applies
/// immediately. Views are always computed from the current filter state.
/// Must be created within a tokio runtime.
pub struct BrowseSession {
    catalogue: Arc<Catalogue>,
    scope: Scope,
    options: BrowseOptions,
    filter: FilterState,
    raw_search: String,
    /// Sequence number of the latest search input, typed or explicit.
    input_seq: u64,
    /// Debounced values older than this were overtaken by an explicit search.
    explicit_seq: u64,
    debouncer: Debouncer<Typed>,
    stabilized: Stabilized<Typed>,
    events: broadcast::Receiver<QueryKey>,
}

impl BrowseSession {
    pub fn new(catalogue: Arc<Catalogue>, scope: Scope, options: BrowseOptions) -> Self {
        let (debouncer, stabilized) = Debouncer::new(options.debounce);
        let events = catalogue.subscribe();
        Self {
            catalogue,
            scope,
            options,
            filter: FilterState::default(),
            raw_search: String::new(),
            input_seq: 0,
            explicit_seq: 0,
            debouncer,
            stabilized,
            events,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn options(&self) -> &BrowseOptions {
        &self.options
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The search text as typed, which may be ahead of the applied term.
    pub fn raw_search(&self) -> &str {
        &self.raw_search
    }

    /// Record typed search text. The page resets at once; the term itself is
    /// applied once typing pauses for the debounce period.
    pub fn input_search(&mut self, raw: &str) {
        self.raw_search = raw.to_string();
        self.filter.set_page(1);
        self.input_seq += 1;
        self.debouncer.observe((self.input_seq, raw.to_string()));
    }

    /// Apply a search term immediately, bypassing the debouncer. Typed text
    /// still waiting in the debouncer is discarded when it comes out.
    pub fn set_search_now(&mut self, term: &str) {
        self.input_seq += 1;
        self.explicit_seq = self.input_seq;
        self.raw_search = term.to_string();
        self.filter.set_search(term);
    }

    pub fn set_categories<I, S>(&mut self, slugs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter.set_categories(slugs);
    }

    pub fn toggle_category(&mut self, slug: &str) {
        self.filter.toggle_category(slug);
    }

    /// Column-header sort: same field flips the order, a new field starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        self.filter.sort_by(field);
    }

    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        self.filter.set_sort(field, order);
    }

    pub fn set_page(&mut self, page: usize) {
        self.filter.set_page(page);
    }

    /// Keys the current view reads.
    pub fn keys(&self) -> Vec<QueryKey> {
        view::keys(&self.scope, &self.filter, &self.options)
    }

    /// Non-blocking snapshot of the screen.
    pub fn view(&mut self) -> ViewState {
        self.apply_stabilized();
        view::peek(&self.catalogue, &self.scope, &self.filter, &self.options)
    }

    /// Snapshot taken after the current keys' outstanding fetches settle.
    pub async fn settled_view(&mut self) -> ViewState {
        self.apply_stabilized();
        view::load(&self.catalogue, &self.scope, &self.filter, &self.options).await
    }

    /// Re-issue every query the current view reads.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the other keys are still refetched.
    pub async fn retry(&mut self) -> Result<(), Error> {
        self.apply_stabilized();
        let mut first_error = None;
        for key in self.keys() {
            if let Err(err) = self.catalogue.refetch(&key).await {
                tracing::warn!(%key, error = %err, "retry failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Wait until the typed search text has been applied.
    pub async fn wait_search_settled(&mut self) {
        self.apply_stabilized();
        while self.filter.search_term != self.raw_search {
            match self.stabilized.next().await {
                Some(term) => {
                    self.apply_term(term);
                }
                None => break,
            }
        }
    }

    /// Wait for something that changes the view: a debounced term, or a
    /// settled or invalidated query the view reads.
    pub async fn changed(&mut self) -> Change {
        loop {
            let keys = self.keys();
            let wake = tokio::select! {
                term = self.stabilized.next() => Wake::Term(term),
                event = self.events.recv() => Wake::Event(event),
            };

            match wake {
                Wake::Term(Some(term)) => {
                    if self.apply_term(term) {
                        return Change::Search;
                    }
                }
                Wake::Term(None) | Wake::Event(Err(RecvError::Closed)) => return Change::Closed,
                Wake::Event(Ok(key)) if keys.contains(&key) => return Change::Data,
                Wake::Event(Ok(_)) => {}
                Wake::Event(Err(RecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "browse session lagged behind cache events");
                    return Change::Data;
                }
            }
        }
    }

    fn apply_stabilized(&mut self) {
        if let Some(term) = self.stabilized.try_latest() {
            self.apply_term(term);
        }
    }

    fn apply_term(&mut self, (seq, term): Typed) -> bool {
        if seq < self.explicit_seq {
            tracing::debug!(seq, term = %term, "dropping typed term overtaken by an explicit search");
            return false;
        }
        if term == self.filter.search_term {
            return false;
        }
        tracing::debug!(term = %term, "applying search term");
        self.filter.set_search(term);
        true
    }
}
