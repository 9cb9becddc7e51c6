//! Debounced repository search.
//!
//! Every keystroke in a search box becomes a `search` call; the runner
//! absorbs the burst. Each call claims a fresh epoch and waits out the
//! debounce window before touching the network, so only the newest query
//! survives to fetch. Superseded calls resolve to `None` instead of stale
//! results.

use crate::api::{repos, Repository};
use crate::error::Result;
use crate::http::{ClientConfig, Transport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a query must sit unchanged before it hits the network
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// What the search form collects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    /// Optional username to scope results to; empty searches everywhere
    pub owner: String,
    pub query: String,
}

/// Coalesces rapid query updates into single search requests.
#[derive(Clone)]
pub struct SearchRunner {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
    debounce: Duration,
    epoch: Arc<AtomicU64>,
}

impl SearchRunner {
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            debounce: SEARCH_DEBOUNCE,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Run one debounced search.
    ///
    /// Resolves to `Ok(None)` when a newer call claimed the epoch while this
    /// one was waiting or fetching. An empty query never hits the network.
    pub async fn search(&self, form: SearchForm) -> Result<Option<Vec<Repository>>> {
        if form.query.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;
        if self.epoch.load(Ordering::SeqCst) != ticket {
            tracing::debug!(query = %form.query, "search superseded during debounce");
            return Ok(None);
        }

        let repositories = repos::search_repos(
            self.transport.as_ref(),
            &self.config,
            &form.owner,
            &form.query,
        )
        .await?;

        if self.epoch.load(Ordering::SeqCst) != ticket {
            tracing::debug!(query = %form.query, "dropping results for superseded search");
            return Ok(None);
        }
        Ok(Some(repositories))
    }
}
