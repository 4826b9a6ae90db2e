//! In-memory [`Store`] implementation for testing and embedding.
//!
//! All tables live in one [`State`] behind a single `std::sync::RwLock`, so
//! every mutation (including the guarded like operations) is applied
//! atomically with respect to every other call. Per-operation call counts
//! are recorded so tests can assert that a code path issued no query.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ContentItem, ContentKind, ItemKey, Stats, Tag};
use crate::sort::{newest_first, SortOrder};

use super::{CounterField, ItemFilter, Store, Window};

#[derive(Default)]
struct State {
    items: HashMap<ItemKey, ContentItem>,
    stats: HashMap<ItemKey, Stats>,
    likes: HashSet<(ItemKey, i64)>,
    categories: BTreeMap<i64, String>,
    item_categories: HashMap<ItemKey, Vec<i64>>,
    tags: BTreeMap<i64, Tag>,
    item_tags: HashMap<ItemKey, Vec<i64>>,
}

impl State {
    /// Item with its current stats row, or zeroed counters when the row is
    /// missing.
    fn hydrate(&self, item: &ContentItem) -> ContentItem {
        let mut item = item.clone();
        item.stats = self
            .stats
            .get(&item.key())
            .cloned()
            .unwrap_or_else(|| Stats::zeroed(DateTime::UNIX_EPOCH));
        item
    }

    fn has_tag(&self, key: ItemKey, name: &str) -> bool {
        self.item_tags.get(&key).is_some_and(|ids| {
            ids.iter()
                .filter_map(|id| self.tags.get(id))
                .any(|t| t.name == name)
        })
    }

    fn published(&self, kind: ContentKind, filter: &ItemFilter) -> Vec<ContentItem> {
        self.items
            .values()
            .filter(|i| i.kind() == kind && i.is_published())
            .filter(|i| filter.matches_fields(i))
            .filter(|i| match &filter.tag {
                Some(name) => self.has_tag(i.key(), name),
                None => true,
            })
            .map(|i| self.hydrate(i))
            .collect()
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, op: &'static str) -> RwLockReadGuard<'_, State> {
        self.record(op);
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self, op: &'static str) -> RwLockWriteGuard<'_, State> {
        self.record(op);
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, op: &'static str) {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        *calls.entry(op).or_insert(0) += 1;
    }

    /// How many times the named [`Store`] operation has been called.
    pub fn call_count(&self, op: &str) -> usize {
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.get(op).copied().unwrap_or(0)
    }

    /// Total number of [`Store`] operations called so far.
    pub fn total_calls(&self) -> usize {
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.values().sum()
    }

    /// Insert (or replace) an item. Its `stats` become the stats row.
    pub fn insert_item(&self, item: ContentItem) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.stats.insert(item.key(), item.stats.clone());
        state.items.insert(item.key(), item);
    }

    /// Attach a category to an item, creating the category if needed.
    pub fn attach_category(&self, key: ItemKey, category_id: i64, name: &str) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.categories.insert(category_id, name.to_string());
        let ids = state.item_categories.entry(key).or_default();
        if !ids.contains(&category_id) {
            ids.push(category_id);
        }
    }

    /// Attach a tag to an item, creating the tag if needed.
    pub fn attach_tag(&self, key: ItemKey, tag: Tag) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let tag_id = tag.id;
        state.tags.insert(tag_id, tag);
        let ids = state.item_tags.entry(key).or_default();
        if !ids.contains(&tag_id) {
            ids.push(tag_id);
        }
    }

    /// Remove the stats row of an item, simulating a broken cascade.
    pub fn drop_stats(&self, key: ItemKey) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.stats.remove(&key);
    }

    /// Current stats row of an item, read without counting as a call.
    pub fn stats(&self, key: ItemKey) -> Option<Stats> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.stats.get(&key).cloned()
    }

    /// Number of like rows for an item, read without counting as a call.
    pub fn like_rows(&self, key: ItemKey) -> usize {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.likes.iter().filter(|(k, _)| *k == key).count()
    }

    /// Whether a like row exists, read without counting as a call.
    pub fn has_like(&self, key: ItemKey, user_id: i64) -> bool {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.likes.contains(&(key, user_id))
    }
}

fn bump(stats: &mut Stats, field: CounterField, delta: i64, now: DateTime<Utc>) {
    let counter = match field {
        CounterField::Views => &mut stats.view_count,
        CounterField::Likes => &mut stats.like_count,
    };
    *counter = counter.saturating_add(delta).max(0);
    stats.updated_at = now;
}

#[async_trait]
impl Store for InMemoryStore {
    async fn find_item(&self, key: ItemKey) -> Result<Option<ContentItem>> {
        let state = self.read("find_item");
        Ok(state.items.get(&key).map(|i| state.hydrate(i)))
    }

    async fn count_items(&self, kind: ContentKind, filter: &ItemFilter) -> Result<i64> {
        let state = self.read("count_items");
        Ok(state.published(kind, filter).len() as i64)
    }

    async fn fetch_items(
        &self,
        kind: ContentKind,
        filter: &ItemFilter,
        sort: SortOrder,
        window: Option<Window>,
    ) -> Result<Vec<ContentItem>> {
        let state = self.read("fetch_items");
        let mut items = state.published(kind, filter);
        items.sort_by(|a, b| sort.compare(a, b));
        Ok(match window {
            Some(w) => items
                .into_iter()
                .skip(usize::try_from(w.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(w.limit).unwrap_or(0))
                .collect(),
            None => items,
        })
    }

    async fn category_names(&self, key: ItemKey) -> Result<Vec<String>> {
        let state = self.read("category_names");
        Ok(state
            .item_categories
            .get(&key)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.categories.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn category_ids(&self, key: ItemKey) -> Result<Vec<i64>> {
        let state = self.read("category_ids");
        let published = state.items.get(&key).is_some_and(|i| i.is_published());
        if !published {
            return Ok(Vec::new());
        }
        Ok(state.item_categories.get(&key).cloned().unwrap_or_default())
    }

    async fn items_in_categories(
        &self,
        kind: ContentKind,
        category_ids: &[i64],
        exclude_id: Option<i64>,
    ) -> Result<Vec<ContentItem>> {
        let state = self.read("items_in_categories");
        let mut items: Vec<ContentItem> = state
            .items
            .values()
            .filter(|i| i.kind() == kind && i.is_published())
            .filter(|i| Some(i.id) != exclude_id)
            .filter(|i| {
                state
                    .item_categories
                    .get(&i.key())
                    .is_some_and(|ids| ids.iter().any(|id| category_ids.contains(id)))
            })
            .map(|i| state.hydrate(i))
            .collect();
        items.sort_by(|a, b| newest_first(a.published_at, b.published_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    async fn liked_item_ids(
        &self,
        kind: ContentKind,
        user_id: i64,
        item_ids: &[i64],
    ) -> Result<Vec<i64>> {
        let state = self.read("liked_item_ids");
        Ok(item_ids
            .iter()
            .copied()
            .filter(|id| state.likes.contains(&(ItemKey::new(kind, *id), user_id)))
            .collect())
    }

    async fn like_exists(&self, key: ItemKey, user_id: i64) -> Result<bool> {
        let state = self.read("like_exists");
        Ok(state.likes.contains(&(key, user_id)))
    }

    async fn increment_counter(
        &self,
        key: ItemKey,
        field: CounterField,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>> {
        let mut state = self.write("increment_counter");
        Ok(state.stats.get_mut(&key).map(|stats| {
            bump(stats, field, delta, now);
            stats.clone()
        }))
    }

    async fn insert_like(
        &self,
        key: ItemKey,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>> {
        let mut state = self.write("insert_like");
        if state.likes.contains(&(key, user_id)) {
            return Ok(None);
        }
        let Some(stats) = state.stats.get_mut(&key) else {
            anyhow::bail!("stats row missing for {}", key);
        };
        bump(stats, CounterField::Likes, 1, now);
        let updated = stats.clone();
        state.likes.insert((key, user_id));
        Ok(Some(updated))
    }

    async fn delete_like(
        &self,
        key: ItemKey,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>> {
        let mut state = self.write("delete_like");
        if !state.likes.contains(&(key, user_id)) {
            return Ok(None);
        }
        let Some(stats) = state.stats.get_mut(&key) else {
            anyhow::bail!("stats row missing for {}", key);
        };
        bump(stats, CounterField::Likes, -1, now);
        let updated = stats.clone();
        state.likes.remove(&(key, user_id));
        Ok(Some(updated))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let state = self.read("list_tags");
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}
