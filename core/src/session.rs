//! Caller-facing search entry point with a short-lived result cache.
//!
//! # Design
//! `SearchSession` sits in front of a `Fetcher` and owns the concerns the
//! fetcher deliberately leaves out:
//! - criteria are normalized and validated before anything is sent;
//! - a page fetched for some criteria is served again, without a request,
//!   until it is older than `ttl`;
//! - identical searches that overlap in time share one request;
//! - failures raise the `error` flag on the outcome instead of surfacing as
//!   an `Err`, and are never cached.
//!
//! State lives behind a `std::sync::Mutex` that is only held between
//! awaits. Freshness is measured with `tokio::time::Instant`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::error::{CriteriaError, SearchError};
use crate::fetch::Fetcher;
use crate::types::{ResultPage, SearchCriteria, SearchOutcome};

type PendingSearch = Shared<BoxFuture<'static, Result<ResultPage, SearchError>>>;

struct CachedPage {
    page: ResultPage,
    fetched_at: Instant,
}

#[derive(Default)]
struct SessionState {
    fresh: HashMap<SearchCriteria, CachedPage>,
    in_flight: HashMap<SearchCriteria, PendingSearch>,
}

enum Lookup {
    Fresh(ResultPage),
    Pending(PendingSearch),
}

/// Clears the in-flight entry for `criteria` when the waiting search ends,
/// whether it completed or was dropped mid-await. An entry that has since
/// been replaced by another request is left alone.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
    criteria: &'a SearchCriteria,
    pending: PendingSearch,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.state);
        if state
            .in_flight
            .get(self.criteria)
            .is_some_and(|current| current.ptr_eq(&self.pending))
        {
            state.in_flight.remove(self.criteria);
        }
    }
}

pub struct SearchSession {
    fetcher: Arc<Fetcher>,
    ttl: Duration,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(fetcher: Fetcher, ttl: Duration) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            ttl,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Result<Self, SearchError> {
        Ok(Self::new(Fetcher::from_config(config)?, config.cache_ttl))
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Run a search. Only invalid criteria produce an `Err`; a failed
    /// request yields an empty page with `error` set.
    pub async fn search(&self, criteria: SearchCriteria) -> Result<SearchOutcome, CriteriaError> {
        let criteria = criteria.normalized();
        criteria.validate()?;

        let pending = match self.lookup(&criteria) {
            Lookup::Fresh(page) => {
                debug!(page = criteria.page, "serving cached result page");
                return Ok(SearchOutcome { page, error: false });
            }
            Lookup::Pending(pending) => pending,
        };

        let guard = InFlightGuard {
            state: &self.state,
            criteria: &criteria,
            pending,
        };
        let result = guard.pending.clone().await;
        let outcome = self.settle(&criteria, result);
        drop(guard);
        Ok(outcome)
    }

    /// Forget every cached page. Requests already in flight are unaffected.
    pub fn invalidate(&self) {
        self.lock().fresh.clear();
    }

    fn lookup(&self, criteria: &SearchCriteria) -> Lookup {
        let mut state = self.lock();
        let ttl = self.ttl;
        state.fresh.retain(|_, cached| cached.fetched_at.elapsed() < ttl);

        if let Some(cached) = state.fresh.get(criteria) {
            return Lookup::Fresh(cached.page.clone());
        }
        if let Some(pending) = state.in_flight.get(criteria) {
            debug!(page = criteria.page, "joining in-flight search");
            return Lookup::Pending(pending.clone());
        }

        let fetcher = Arc::clone(&self.fetcher);
        let owned = criteria.clone();
        let pending = async move { fetcher.try_fetch(&owned).await }
            .boxed()
            .shared();
        state.in_flight.insert(criteria.clone(), pending.clone());
        Lookup::Pending(pending)
    }

    fn settle(
        &self,
        criteria: &SearchCriteria,
        result: Result<ResultPage, SearchError>,
    ) -> SearchOutcome {
        match result {
            Ok(page) => {
                self.lock().fresh.insert(
                    criteria.clone(),
                    CachedPage {
                        page: page.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                SearchOutcome { page, error: false }
            }
            Err(err) => {
                warn!(error = %err, page = criteria.page, "search failed");
                SearchOutcome {
                    page: ResultPage::empty(criteria.page),
                    error: true,
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }
}

fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
