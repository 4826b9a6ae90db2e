//! Store gateway for the content catalog.
//!
//! The [`Store`] trait is the only way the engine touches durable state.
//! It exposes reads, a server-evaluated counter update, and the two
//! conflict-guarded like mutations the stats ledger builds its toggle on.
//! Implementations: SQLite (application crate) and [`memory::InMemoryStore`].
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ContentItem, ContentKind, ItemKey, Stats, Tag};
use crate::sort::SortOrder;

/// Which counter of a stats row to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    Views,
    Likes,
}

impl CounterField {
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::Views => "view_count",
            CounterField::Likes => "like_count",
        }
    }
}

/// Case folding used for text search, on stored text and on queries alike.
///
/// Full Unicode lowercasing, so "Đau Bụng" and "đau bụng" fold to the same
/// string. Stores that match in SQL must persist text folded with this
/// function rather than rely on the database's own case folding.
pub fn fold_text(text: &str) -> String {
    text.to_lowercase()
}

/// Filters applied to published items of one kind, before counting and
/// sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Lowercased substring to look for; `None` matches everything.
    pub text: Option<String>,
    /// When false, the post summary / video description is searched too.
    pub title_only: bool,
    pub premium: Option<bool>,
    /// Video-only short-form flag.
    pub is_short: Option<bool>,
    /// Exact tag name.
    pub tag: Option<String>,
}

impl ItemFilter {
    /// Normalises raw search input: trimmed, folded, blank becomes `None`.
    pub fn normalize_text(raw: Option<&str>) -> Option<String> {
        raw.map(str::trim).filter(|s| !s.is_empty()).map(fold_text)
    }

    /// In-process evaluation of the text, premium and short-form filters.
    ///
    /// Tag matching needs the junction data and is left to the store.
    pub fn matches_fields(&self, item: &ContentItem) -> bool {
        if let Some(needle) = &self.text {
            let in_title = fold_text(&item.title).contains(needle.as_str());
            let in_text = !self.title_only
                && item
                    .searchable_text()
                    .is_some_and(|t| fold_text(t).contains(needle.as_str()));
            if !in_title && !in_text {
                return false;
            }
        }
        if let Some(premium) = self.premium {
            if item.is_premium != premium {
                return false;
            }
        }
        if let Some(short) = self.is_short {
            if item.is_short() != Some(short) {
                return false;
            }
        }
        true
    }
}

/// Offset/limit window for [`Store::fetch_items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// Abstract store gateway.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_item`](Store::find_item) | Point read of an item, any status |
/// | [`count_items`](Store::count_items) | Filtered count of published items |
/// | [`fetch_items`](Store::fetch_items) | Filtered, sorted, windowed read |
/// | [`category_names`](Store::category_names) | Category names of an item |
/// | [`category_ids`](Store::category_ids) | Category ids of a published item |
/// | [`items_in_categories`](Store::items_in_categories) | Published items sharing a category |
/// | [`liked_item_ids`](Store::liked_item_ids) | Batched liked-state lookup |
/// | [`like_exists`](Store::like_exists) | Point liked-state lookup |
/// | [`increment_counter`](Store::increment_counter) | Atomic counter update |
/// | [`insert_like`](Store::insert_like) | Guarded like insert + count |
/// | [`delete_like`](Store::delete_like) | Guarded like delete + count |
/// | [`list_tags`](Store::list_tags) | All tags by name |
#[async_trait]
pub trait Store: Send + Sync {
    /// Retrieve an item with its stats and expert, regardless of status.
    async fn find_item(&self, key: ItemKey) -> Result<Option<ContentItem>>;

    /// Count published items of `kind` that pass `filter`.
    async fn count_items(&self, kind: ContentKind, filter: &ItemFilter) -> Result<i64>;

    /// Published items of `kind` that pass `filter`, ordered by `sort`.
    ///
    /// With a window, only that slice of the ordered result is returned.
    async fn fetch_items(
        &self,
        kind: ContentKind,
        filter: &ItemFilter,
        sort: SortOrder,
        window: Option<Window>,
    ) -> Result<Vec<ContentItem>>;

    /// Names of every category attached to the item.
    async fn category_names(&self, key: ItemKey) -> Result<Vec<String>>;

    /// Ids of the categories attached to the item. Empty unless the item
    /// exists and is published.
    async fn category_ids(&self, key: ItemKey) -> Result<Vec<i64>>;

    /// Published items of `kind` attached to at least one of
    /// `category_ids`, newest first, never including `exclude_id`.
    async fn items_in_categories(
        &self,
        kind: ContentKind,
        category_ids: &[i64],
        exclude_id: Option<i64>,
    ) -> Result<Vec<ContentItem>>;

    /// The subset of `item_ids` that `user_id` currently likes, in one
    /// round trip.
    async fn liked_item_ids(
        &self,
        kind: ContentKind,
        user_id: i64,
        item_ids: &[i64],
    ) -> Result<Vec<i64>>;

    /// Whether a like row exists for the pair.
    async fn like_exists(&self, key: ItemKey, user_id: i64) -> Result<bool>;

    /// Apply `delta` to one counter as a single store-evaluated statement,
    /// clamped at zero, stamping `updated_at = now`.
    ///
    /// Returns the stats row after the update, or `None` when the item has
    /// no stats row.
    async fn increment_counter(
        &self,
        key: ItemKey,
        field: CounterField,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>>;

    /// Insert the like row and increment `like_count` as one atomic unit,
    /// guarded by the `(user, item)` uniqueness constraint.
    ///
    /// Returns the updated stats, or `None` when the row already existed
    /// (nothing was changed).
    async fn insert_like(
        &self,
        key: ItemKey,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>>;

    /// Delete the like row and decrement `like_count` (clamped at zero) as
    /// one atomic unit.
    ///
    /// Returns the updated stats, or `None` when there was no row to delete
    /// (nothing was changed).
    async fn delete_like(
        &self,
        key: ItemKey,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>>;

    /// Every tag, ordered by name.
    async fn list_tags(&self) -> Result<Vec<Tag>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::post;

    #[test]
    fn test_normalize_text_folds_non_ascii() {
        assert_eq!(ItemFilter::normalize_text(Some("  ĐAU Bụng ")).as_deref(), Some("đau bụng"));
        assert_eq!(ItemFilter::normalize_text(Some("   ")), None);
        assert_eq!(ItemFilter::normalize_text(None), None);
    }

    #[test]
    fn test_text_match_ignores_case_beyond_ascii() {
        let item = post(1, "Đau Bụng Kinh", 0);
        for query in ["đau bụng", "ĐAU BỤNG", "Đau Bụng"] {
            let filter = ItemFilter {
                text: ItemFilter::normalize_text(Some(query)),
                title_only: true,
                ..Default::default()
            };
            assert!(filter.matches_fields(&item), "{} should match", query);
        }
    }
}
