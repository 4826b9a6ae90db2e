//! # Catalog Query Engine
//!
//! Single-kind listing and item detail.
//!
//! ## Listing pipeline
//!
//! ```text
//! ListQuery
//!   ├── parse sort token ──────────── InvalidArgument on unknown token
//!   ├── clamp page / page size
//!   ├── build ItemFilter (published, text, premium, is_short, tag)
//!   ├── Store::count_items ────────── total before pagination
//!   ├── Store::fetch_items(window) ── sorted, offset/limit
//!   ├── ViewerStateResolver ───────── one batched liked-state call
//!   └── Page<ItemSummary>
//! ```
//!
//! Listing never touches counters. Detail records exactly one view, and
//! only for a published item.

use std::sync::Arc;

use crate::error::{CatalogError, CatalogResult};
use crate::ledger::StatsLedger;
use crate::models::{ContentKind, DetailContent, ItemDetail, ItemKey, ItemSummary, ViewerState};
use crate::page::{Page, PageRequest, MAX_PAGE_SIZE};
use crate::sort::SortOrder;
use crate::store::{ItemFilter, Store, Window};
use crate::viewer::ViewerStateResolver;

/// Default page size for listings and search.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Caller-supplied listing parameters, before validation.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub premium: Option<bool>,
    pub is_short: Option<bool>,
    pub tag: Option<String>,
}

pub struct CatalogEngine<S: Store> {
    store: Arc<S>,
    ledger: StatsLedger<S>,
    viewer: ViewerStateResolver<S>,
    default_page_size: i64,
}

impl<S: Store> Clone for CatalogEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            viewer: self.viewer.clone(),
            default_page_size: self.default_page_size,
        }
    }
}

impl<S: Store> CatalogEngine<S> {
    pub fn new(store: Arc<S>, ledger: StatsLedger<S>) -> Self {
        Self {
            viewer: ViewerStateResolver::new(store.clone()),
            store,
            ledger,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, page_size: i64) -> Self {
        self.default_page_size = page_size;
        self
    }

    /// One page of published items of `kind`.
    pub async fn list(
        &self,
        kind: ContentKind,
        query: &ListQuery,
        viewer: Option<i64>,
    ) -> CatalogResult<Page<ItemSummary>> {
        let sort = SortOrder::parse(query.sort.as_deref())?;
        if kind == ContentKind::Post && query.is_short.is_some() {
            return Err(CatalogError::invalid("isShort applies to videos only"));
        }

        let request = PageRequest::clamped(
            query.page.unwrap_or(1),
            query.page_size.unwrap_or(self.default_page_size),
            MAX_PAGE_SIZE,
        );
        let filter = ItemFilter {
            text: ItemFilter::normalize_text(query.search.as_deref()),
            title_only: false,
            premium: query.premium,
            is_short: query.is_short,
            tag: query
                .tag
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        };

        let total = self.store.count_items(kind, &filter).await?;
        let window = Window {
            offset: request.offset(),
            limit: request.limit(),
        };
        let items = self
            .store
            .fetch_items(kind, &filter, sort, Some(window))
            .await?;

        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let liked = self.viewer.liked_ids(kind, viewer, &ids).await?;
        let summaries = items
            .into_iter()
            .map(|item| {
                let is_liked = liked.contains(&item.id);
                ItemSummary::from_item(item, is_liked)
            })
            .collect();

        Ok(Page::new(request, total, summaries))
    }

    /// Full detail of a published item. Records one view.
    pub async fn detail(&self, key: ItemKey, viewer: Option<i64>) -> CatalogResult<ItemDetail> {
        let mut item = match self.store.find_item(key).await? {
            Some(item) if item.is_published() => item,
            _ => return Err(CatalogError::NotFound(key)),
        };

        if let Some(stats) = self.ledger.record_view(key).await? {
            item.stats = stats;
        }

        let liked = self.viewer.liked_ids(key.kind, viewer, &[key.id]).await?;
        let categories = self.store.category_names(key).await?;

        Ok(ItemDetail {
            id: item.id,
            kind: item.kind(),
            title: item.title,
            thumbnail_url: item.thumbnail_url,
            categories,
            published_at: item.published_at,
            view_count: item.stats.view_count,
            like_count: item.stats.like_count,
            is_premium: item.is_premium,
            expert: item.expert,
            content: DetailContent::from(item.body),
            viewer_state: ViewerState {
                liked: liked.contains(&key.id),
            },
        })
    }
}
