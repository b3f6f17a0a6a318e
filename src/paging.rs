//! Page slices and the pagination arithmetic shared by every listing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default rows per page when the screen does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: &[u32] = &[10, 25, 50, 100];

/// A 1-based page number and a page size, both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    /// Zero-based offset of the first row of this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// `ceil(total_records / page_size)`; zero records means zero pages.
pub fn total_pages(total_records: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_records.div_ceil(u64::from(page_size))
}

/// One bounded slice of a larger result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Server order, never re-sorted on the client.
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Build a page from a server reply.
    ///
    /// `total_pages` is always derived from `total_records`; a disagreeing
    /// server value is logged and ignored. Items beyond `page_size` are
    /// dropped, and a page number past the last page yields no items.
    pub fn assemble(
        mut items: Vec<T>,
        request: PageRequest,
        total_records: u64,
        reported_total_pages: Option<u64>,
    ) -> Self {
        let pages = total_pages(total_records, request.page_size);
        if let Some(reported) = reported_total_pages {
            if reported != pages {
                debug!(
                    reported,
                    computed = pages,
                    total_records,
                    page_size = request.page_size,
                    "server total_pages disagrees with total_records"
                );
            }
        }

        if u64::from(request.page) > pages {
            if !items.is_empty() {
                warn!(
                    page = request.page,
                    total_pages = pages,
                    returned = items.len(),
                    "rows returned for out-of-range page, treating as empty"
                );
            }
            items.clear();
        } else if items.len() > request.page_size as usize {
            warn!(
                page_size = request.page_size,
                returned = items.len(),
                "server returned more rows than the page size, truncating"
            );
            items.truncate(request.page_size as usize);
        }

        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_records,
            total_pages: pages,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::assemble(Vec::new(), request, 0, None)
    }

    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages
    }

    /// 1-based positions of the first and last rows shown, `None` when empty.
    pub fn row_span(&self) -> Option<(u64, u64)> {
        if self.items.is_empty() {
            return None;
        }
        let first = self.request().offset() + 1;
        Some((first, first + self.items.len() as u64 - 1))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_records: self.total_records,
            total_pages: self.total_pages,
        }
    }
}
