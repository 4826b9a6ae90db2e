//! Offset pagination contract.
//!
//! Callers never get a validation error for page numbers or sizes: the page
//! is floored at 1 and the size clamped into `[1, max]`.

use serde::Serialize;

/// Upper bound on page size for listings and search.
pub const MAX_PAGE_SIZE: i64 = 50;

/// Upper bound on page size for related content.
pub const MAX_RELATED_PAGE_SIZE: i64 = 20;

/// A clamped page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn clamped(page: i64, page_size: i64, max_page_size: i64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, max_page_size.max(1)),
        }
    }

    /// Number of items skipped before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Applies this window to an already-ordered, fully materialised list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }

    pub fn empty<T>(&self) -> Page<T> {
        Page {
            page: self.page,
            page_size: self.page_size,
            total: 0,
            items: Vec::new(),
        }
    }
}

/// One page of results plus the filtered total before pagination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, total: i64, items: Vec<T>) -> Self {
        Self {
            page: request.page,
            page_size: request.page_size,
            total,
            items,
        }
    }

    /// Paginates a fully materialised, already-ordered list.
    pub fn from_all(request: PageRequest, all: Vec<T>) -> Self {
        let total = all.len() as i64;
        Self::new(request, total, request.slice(all))
    }
}
