//! Cross-type aggregation: search and related content over posts and
//! videos together.
//!
//! Both operations materialise every matching item of both kinds before
//! merging and paginating in memory. Cost therefore grows with the
//! catalog, not with the page.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::CatalogResult;
use crate::models::{ContentKind, ItemKey, MixedItem};
use crate::page::{Page, PageRequest, MAX_PAGE_SIZE, MAX_RELATED_PAGE_SIZE};
use crate::sort::{newest_first, SortOrder};
use crate::store::{ItemFilter, Store};

/// Default page size for search.
pub const DEFAULT_SEARCH_PAGE_SIZE: i64 = 10;

/// Default page size for related content.
pub const DEFAULT_RELATED_PAGE_SIZE: i64 = 6;

/// Order source for related content.
pub trait Shuffler: Send + Sync {
    fn shuffle(&self, items: &mut [MixedItem]);
}

/// Shuffles with the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngShuffler;

impl Shuffler for ThreadRngShuffler {
    fn shuffle(&self, items: &mut [MixedItem]) {
        items.shuffle(&mut rand::thread_rng());
    }
}

/// Deterministic shuffling from a fixed seed.
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Shuffler for SeededShuffler {
    fn shuffle(&self, items: &mut [MixedItem]) {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        items.shuffle(&mut *rng);
    }
}

/// Leaves the order untouched (newest first, as fetched).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoShuffle;

impl Shuffler for NoShuffle {
    fn shuffle(&self, _items: &mut [MixedItem]) {}
}

/// Search results: the echoed query plus one page of mixed items.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(flatten)]
    pub page: Page<MixedItem>,
}

pub struct Aggregator<S: Store> {
    store: Arc<S>,
    shuffler: Arc<dyn Shuffler>,
    search_page_size: i64,
    related_page_size: i64,
}

impl<S: Store> Clone for Aggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            shuffler: self.shuffler.clone(),
            search_page_size: self.search_page_size,
            related_page_size: self.related_page_size,
        }
    }
}

impl<S: Store> Aggregator<S> {
    pub fn new(store: Arc<S>, shuffler: Arc<dyn Shuffler>) -> Self {
        Self {
            store,
            shuffler,
            search_page_size: DEFAULT_SEARCH_PAGE_SIZE,
            related_page_size: DEFAULT_RELATED_PAGE_SIZE,
        }
    }

    pub fn with_page_sizes(mut self, search: i64, related: i64) -> Self {
        self.search_page_size = search;
        self.related_page_size = related;
        self
    }

    /// Title search across both kinds, newest first.
    ///
    /// A blank query yields an empty page without touching the store.
    pub async fn search(
        &self,
        query: Option<&str>,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> CatalogResult<SearchResponse> {
        let request = PageRequest::clamped(
            page.unwrap_or(1),
            page_size.unwrap_or(self.search_page_size),
            MAX_PAGE_SIZE,
        );
        let echoed = query.map(str::trim).unwrap_or_default().to_string();
        let Some(text) = ItemFilter::normalize_text(query) else {
            return Ok(SearchResponse {
                query: echoed,
                page: request.empty(),
            });
        };

        let filter = ItemFilter {
            text: Some(text),
            title_only: true,
            ..Default::default()
        };
        let mut merged: Vec<MixedItem> = Vec::new();
        for kind in ContentKind::ALL {
            let items = self
                .store
                .fetch_items(kind, &filter, SortOrder::Newest, None)
                .await?;
            merged.extend(items.into_iter().map(MixedItem::from));
        }
        merged.sort_by(merged_order);

        Ok(SearchResponse {
            query: echoed,
            page: Page::from_all(request, merged),
        })
    }

    /// Published items sharing a category with `key`, in shuffled order.
    ///
    /// An unknown, unpublished, or uncategorised source yields an empty page
    /// without scanning either kind. Never records views.
    pub async fn related(
        &self,
        key: ItemKey,
        page: Option<i64>,
        page_size: Option<i64>,
    ) -> CatalogResult<Page<MixedItem>> {
        let request = PageRequest::clamped(
            page.unwrap_or(1),
            page_size.unwrap_or(self.related_page_size),
            MAX_RELATED_PAGE_SIZE,
        );
        let category_ids = self.store.category_ids(key).await?;
        if category_ids.is_empty() {
            return Ok(request.empty());
        }

        let mut merged: Vec<MixedItem> = Vec::new();
        for kind in ContentKind::ALL {
            let exclude = (kind == key.kind).then_some(key.id);
            let items = self
                .store
                .items_in_categories(kind, &category_ids, exclude)
                .await?;
            merged.extend(items.into_iter().map(MixedItem::from));
        }
        self.shuffler.shuffle(&mut merged);

        Ok(Page::from_all(request, merged))
    }
}

/// Publication time descending, then kind, then id descending.
fn merged_order(a: &MixedItem, b: &MixedItem) -> Ordering {
    newest_first(a.published_at, b.published_at)
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| b.id.cmp(&a.id))
}
