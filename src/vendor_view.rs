use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::api_client::{ApiClient, SearchRequest, SearchResult, Vendor};
use crate::error::ApiError;

/// The two mutually exclusive ways vendor data is presented: the full cached
/// collection under local filtering, or the most recent remote result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    List,
    Search,
}

/// What a call to [`VendorView::search`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results were committed and the view switched to search mode.
    Applied { count: usize },
    /// A newer search was issued while this one was in flight; its response
    /// was discarded and the view left alone.
    Superseded,
    /// The query was empty after trimming; no request was dispatched and the
    /// view fell back to list mode.
    EmptyQuery,
}

struct ViewState {
    mode: ViewMode,
    results: Vec<SearchResult>,
}

/// Reconciles the two vendor data sources into one view.
///
/// The cached vendor collection (refreshed wholesale from `GET /vendors`,
/// filtered locally per keystroke) and the remote ranked search results live
/// behind separate locks, so a list refresh and a search may be in flight at
/// the same time without blocking each other.
///
/// Rapid successive searches are arbitrated by a monotone sequence number:
/// only the response belonging to the most recently issued search may commit.
/// A response arriving for an already-superseded search is ignored, never
/// merged.
pub struct VendorView {
    client: ApiClient,
    vendors: Mutex<Vec<Vendor>>,
    view: Mutex<ViewState>,
    search_seq: AtomicU64,
}

impl VendorView {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            vendors: Mutex::new(Vec::new()),
            view: Mutex::new(ViewState {
                mode: ViewMode::List,
                results: Vec::new(),
            }),
            search_seq: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.view.lock().unwrap().mode
    }

    /// Snapshot of the cached vendor collection, in server order.
    pub fn vendors(&self) -> Vec<Vendor> {
        self.vendors.lock().unwrap().clone()
    }

    /// Snapshot of the last committed search results, in the order received.
    /// Stays available after a dismiss, until the next search overwrites it.
    pub fn results(&self) -> Vec<SearchResult> {
        self.view.lock().unwrap().results.clone()
    }

    /// Replace the cached collection wholesale from `GET /vendors`. On any
    /// error the cache keeps its previous contents and the classified error
    /// surfaces. Returns the new collection size.
    pub async fn refresh(&self) -> Result<usize, ApiError> {
        let fetched = self.client.get_vendors().await?;
        let count = fetched.len();
        *self.vendors.lock().unwrap() = fetched;
        info!(target: "vendor_view", "vendor list refreshed ({} entries)", count);
        Ok(count)
    }

    /// Pure local filtering over the cached collection: case-insensitive
    /// substring match on name OR category, order-preserving. No network.
    pub fn filtered(&self, query: &str) -> Vec<Vendor> {
        let vendors = self.vendors.lock().unwrap();
        filter_vendors(&vendors, query)
    }

    /// Explicit remote search, `POST /search/vendors`. An empty or
    /// whitespace-only query short-circuits to list mode without dispatching.
    /// On success the results replace the displayed set and the view switches
    /// to search mode — unless a newer search was issued in the meantime, in
    /// which case this response is discarded. On error nothing is mutated.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<SearchOutcome, ApiError> {
        if query.trim().is_empty() {
            self.view.lock().unwrap().mode = ViewMode::List;
            return Ok(SearchOutcome::EmptyQuery);
        }

        let ticket = self.search_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let request = SearchRequest {
            query: query.to_string(),
            max_results,
        };

        let results = self.client.search_vendors(&request).await?;

        let mut view = self.view.lock().unwrap();
        if self.search_seq.load(Ordering::SeqCst) != ticket {
            debug!(target: "vendor_view", "search #{} superseded, dropping {} results", ticket, results.len());
            return Ok(SearchOutcome::Superseded);
        }

        let count = results.len();
        view.results = results;
        view.mode = ViewMode::Search;
        info!(target: "vendor_view", "search #{} committed ({} results)", ticket, count);
        Ok(SearchOutcome::Applied { count })
    }

    /// Back to list mode. The last result set is kept, not discarded.
    pub fn dismiss(&self) {
        self.view.lock().unwrap().mode = ViewMode::List;
    }
}

/// Case-insensitive substring predicate over vendor name OR category.
/// Preserves the input order; an empty query keeps everything.
pub fn filter_vendors(vendors: &[Vendor], query: &str) -> Vec<Vendor> {
    let needle = query.to_lowercase();
    vendors
        .iter()
        .filter(|v| {
            v.name.to_lowercase().contains(&needle) || v.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
