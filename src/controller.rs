//! Filtered, paged list controller.
//!
//! One controller owns the state of one listing screen: the editable filter
//! store, the criteria last applied, the current page, and the last error
//! notice. Every user intent is an explicit method that returns a
//! [`FetchTicket`]; the screen runs the ticket against a [`ListingService`]
//! and hands the [`FetchOutcome`] back through [`ListController::apply`].
//!
//! **Rules:**
//! - Applying filters always goes back to page 1
//! - Changing the page size always goes back to page 1
//! - Only the most recently issued ticket may change the page; older
//!   outcomes are discarded as stale
//! - A failed fetch keeps the previous rows on screen
//! - A successful mutation triggers a full re-fetch, never local list surgery

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{ListEnvelope, ListingService, MutationOp, MutationService};
use crate::error::ListError;
use crate::filters::{FilterCriteria, FilterStore};
use crate::paging::{Page, PageRequest};

/// Lifecycle of a listing screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// Criteria plus page position: everything that determines a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub criteria: FilterCriteria,
    pub request: PageRequest,
}

/// A fetch the controller has issued and is waiting on.
#[derive(Debug, Clone)]
#[must_use = "a ticket does nothing until it is executed and applied"]
pub struct FetchTicket {
    seq: u64,
    resource: String,
    query: ListQuery,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Run the fetch. Does not touch the controller, so several tickets may
    /// be in flight at once; only the newest will be accepted by `apply`.
    pub async fn execute<T, S>(self, service: &S) -> FetchOutcome<T>
    where
        T: DeserializeOwned,
        S: ListingService,
    {
        let result = service
            .list_page(&self.resource, &self.query.criteria, self.query.request)
            .await
            .and_then(|envelope| decode_page(envelope, self.query.request));
        FetchOutcome {
            seq: self.seq,
            query: self.query,
            result,
        }
    }
}

/// The result of one executed ticket.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub seq: u64,
    pub query: ListQuery,
    pub result: Result<Page<T>, ListError>,
}

fn decode_page<T: DeserializeOwned>(
    envelope: ListEnvelope,
    request: PageRequest,
) -> Result<Page<T>, ListError> {
    let items = envelope
        .items
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value::<T>(row)
                .map_err(|e| ListError::Decode(format!("row {}: {e}", i + 1)))
        })
        .collect::<Result<Vec<T>, ListError>>()?;
    Ok(Page::assemble(
        items,
        request,
        envelope.total_records,
        envelope.total_pages,
    ))
}

/// State owner for one listing screen.
#[derive(Debug)]
pub struct ListController<T> {
    resource: String,
    required: Vec<String>,
    filters: FilterStore,
    applied: FilterCriteria,
    /// Position of the rows on screen; moves only when a fetch succeeds.
    request: PageRequest,
    state: ListState,
    page: Option<Page<T>>,
    notice: Option<ListError>,
    latest_seq: u64,
    in_flight: Option<ListQuery>,
    loaded: Option<ListQuery>,
    failed: Option<ListQuery>,
}

impl<T> ListController<T> {
    pub fn new(resource: &str, defaults: FilterCriteria, page_size: u32) -> Self {
        Self {
            resource: resource.to_string(),
            required: Vec::new(),
            applied: defaults.clone(),
            filters: FilterStore::new(defaults),
            request: PageRequest::first(page_size),
            state: ListState::Idle,
            page: None,
            notice: None,
            latest_seq: 0,
            in_flight: None,
            loaded: None,
            failed: None,
        }
    }

    /// Filters that must be set before any fetch is issued.
    pub fn with_required(mut self, fields: &[&str]) -> Self {
        self.required = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ListState::Loading
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    /// Edit filters. Edits take effect on the next `apply_filters`.
    pub fn filters_mut(&mut self) -> &mut FilterStore {
        &mut self.filters
    }

    /// Criteria used by the current and future page requests.
    pub fn applied_criteria(&self) -> &FilterCriteria {
        &self.applied
    }

    /// Page size of the fetch in flight, else of the rows on screen.
    fn target_size(&self) -> u32 {
        self.in_flight
            .as_ref()
            .map_or(self.request.page_size, |q| q.request.page_size)
    }

    /// Page and size of the rows on screen, not of a fetch still pending.
    pub fn current_request(&self) -> PageRequest {
        self.request
    }

    /// The last page successfully loaded, kept across failures.
    pub fn page(&self) -> Option<&Page<T>> {
        self.page.as_ref()
    }

    pub fn items(&self) -> &[T] {
        self.page.as_ref().map(|p| p.items.as_slice()).unwrap_or(&[])
    }

    /// Last user-visible error, until dismissed or a fetch succeeds.
    pub fn notice(&self) -> Option<&ListError> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    fn validate(&mut self, criteria: &FilterCriteria) -> Result<(), ListError> {
        let required: Vec<&str> = self.required.iter().map(String::as_str).collect();
        criteria.validate(&required).inspect_err(|e| {
            debug!(resource = %self.resource, error = %e, "filters rejected");
            self.notice = Some(e.clone());
        })
    }

    /// Whether `query` is already loaded or already in flight.
    fn is_current(&self, query: &ListQuery) -> bool {
        self.in_flight.as_ref() == Some(query)
            || (self.state == ListState::Loaded && self.loaded.as_ref() == Some(query))
    }

    fn issue(&mut self, query: ListQuery) -> FetchTicket {
        self.latest_seq += 1;
        self.state = ListState::Loading;
        self.in_flight = Some(query.clone());
        debug!(
            resource = %self.resource,
            seq = self.latest_seq,
            page = query.request.page,
            page_size = query.request.page_size,
            "fetch issued"
        );
        FetchTicket {
            seq: self.latest_seq,
            resource: self.resource.clone(),
            query,
        }
    }

    /// First load of the screen with the current filters, at page 1.
    pub fn mount(&mut self) -> Result<FetchTicket, ListError> {
        self.mount_at(1)
    }

    /// First load straight at `page`, for deep links.
    pub fn mount_at(&mut self, page: u32) -> Result<FetchTicket, ListError> {
        let criteria = self.filters.get().clone();
        self.validate(&criteria)?;
        self.applied = criteria.clone();
        let request = PageRequest::new(page, self.target_size());
        Ok(self.issue(ListQuery { criteria, request }))
    }

    /// Snapshot the edited filters and fetch page 1.
    ///
    /// Returns `Ok(None)` when the same query is already loaded or in
    /// flight. Validation failures block the fetch and leave the page as is.
    pub fn apply_filters(&mut self) -> Result<Option<FetchTicket>, ListError> {
        let criteria = self.filters.get().clone();
        self.validate(&criteria)?;
        let query = ListQuery {
            criteria: criteria.clone(),
            request: PageRequest::first(self.target_size()),
        };
        if self.is_current(&query) {
            debug!(resource = %self.resource, "filters unchanged, not re-fetching");
            return Ok(None);
        }
        self.applied = criteria;
        Ok(Some(self.issue(query)))
    }

    /// Restore default filters and fetch page 1.
    pub fn clear_filters(&mut self) -> Result<Option<FetchTicket>, ListError> {
        self.filters.clear();
        self.apply_filters()
    }

    /// Move to `page` (1-based) with the applied criteria.
    pub fn change_page(&mut self, page: u32) -> Option<FetchTicket> {
        let query = ListQuery {
            criteria: self.applied.clone(),
            request: PageRequest::new(page, self.target_size()),
        };
        if self.is_current(&query) {
            return None;
        }
        Some(self.issue(query))
    }

    /// Step forward from the page on screen.
    pub fn next_page(&mut self) -> Option<FetchTicket> {
        let shown = self.page.as_ref().filter(|p| p.has_next())?.page;
        self.change_page(shown + 1)
    }

    /// Step back from the page on screen.
    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        let shown = self.page.as_ref().filter(|p| p.has_previous())?.page;
        self.change_page(shown - 1)
    }

    /// Change rows per page. Always returns to page 1.
    pub fn change_page_size(&mut self, page_size: u32) -> Option<FetchTicket> {
        let page_size = page_size.max(1);
        if page_size == self.target_size() {
            return None;
        }
        let query = ListQuery {
            criteria: self.applied.clone(),
            request: PageRequest::first(page_size),
        };
        Some(self.issue(query))
    }

    /// Re-issue the query that last failed, or else the one on screen, even
    /// if it is already loaded.
    pub fn reload(&mut self) -> FetchTicket {
        let query = self.failed.clone().unwrap_or_else(|| ListQuery {
            criteria: self.applied.clone(),
            request: self.request,
        });
        self.issue(query)
    }

    /// Accept an outcome if it answers the newest ticket.
    ///
    /// Stale outcomes return `ListError::StaleResponse` and change nothing.
    /// Failures move to `Errored`, keep the previous rows and set the notice.
    pub fn apply(&mut self, outcome: FetchOutcome<T>) -> Result<(), ListError> {
        if outcome.seq != self.latest_seq {
            debug!(
                resource = %self.resource,
                seq = outcome.seq,
                latest = self.latest_seq,
                "discarding stale response"
            );
            return Err(ListError::StaleResponse {
                seq: outcome.seq,
                latest: self.latest_seq,
            });
        }

        self.in_flight = None;
        match outcome.result {
            Ok(page) => {
                debug!(
                    resource = %self.resource,
                    seq = outcome.seq,
                    page = page.page,
                    rows = page.items.len(),
                    total_records = page.total_records,
                    "page loaded"
                );
                self.page = Some(page);
                self.request = outcome.query.request;
                self.loaded = Some(outcome.query);
                self.failed = None;
                self.notice = None;
                self.state = ListState::Loaded;
                Ok(())
            }
            Err(e) => {
                warn!(resource = %self.resource, seq = outcome.seq, error = %e, "fetch failed");
                self.notice = Some(e.clone());
                self.failed = Some(outcome.query);
                self.state = ListState::Errored;
                Err(e)
            }
        }
    }
}

impl<T: DeserializeOwned> ListController<T> {
    /// Execute `ticket` and apply its outcome.
    pub async fn run<S: ListingService>(
        &mut self,
        service: &S,
        ticket: FetchTicket,
    ) -> Result<(), ListError> {
        let outcome = ticket.execute(service).await;
        self.apply(outcome)
    }

    /// Send a mutation and, on success, return the re-fetch ticket.
    /// On failure the current rows stay and the error becomes the notice.
    pub async fn submit_mutation<S: MutationService>(
        &mut self,
        service: &S,
        op: MutationOp,
        payload: &Value,
    ) -> Result<FetchTicket, ListError> {
        match service.mutate(&self.resource, op, payload).await {
            Ok(reply) => {
                info!(
                    resource = %self.resource,
                    op = op.as_str(),
                    message = reply.message.as_deref().unwrap_or(""),
                    "mutation succeeded, reloading"
                );
                Ok(self.reload())
            }
            Err(e) => {
                self.notice = Some(e.clone());
                Err(e)
            }
        }
    }
}
