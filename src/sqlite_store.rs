//! SQLite-backed [`Store`] implementation.
//!
//! Posts and videos live in parallel table families (see [`KindTables`]),
//! so every operation picks its tables from the [`ContentKind`] and runs the
//! same SQL shape. Timestamps are stored as Unix seconds.
//!
//! Text search runs `LIKE` over the `*_folded` columns, which hold the text
//! already folded with [`catalog_core::store::fold_text`]. The query is
//! folded the same way by [`ItemFilter::normalize_text`].
//!
//! Counter changes are single `UPDATE ... RETURNING` statements evaluated
//! by SQLite. The like mutations run in a transaction whose first statement
//! is the conflict-guarded insert or delete, so the write lock is taken
//! before anything is read.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use catalog_core::models::{
    ContentBody, ContentItem, ContentKind, Expert, ItemKey, LifecycleStatus, Stats, Tag,
};
use catalog_core::sort::SortOrder;
use catalog_core::store::{CounterField, ItemFilter, Store, Window};

/// Table names of one content kind.
#[derive(Debug)]
pub struct KindTables {
    pub items: &'static str,
    pub stats: &'static str,
    pub likes: &'static str,
    pub categories: &'static str,
    pub tags: &'static str,
    /// Folded secondary searchable column.
    folded_text_column: &'static str,
    /// Variant-specific columns selected alongside the shared ones.
    body_columns: &'static str,
}

static POST_TABLES: KindTables = KindTables {
    items: "posts",
    stats: "post_stats",
    likes: "post_likes",
    categories: "post_categories",
    tags: "post_tags",
    folded_text_column: "summary_folded",
    body_columns: "i.summary, i.body",
};

static VIDEO_TABLES: KindTables = KindTables {
    items: "videos",
    stats: "video_stats",
    likes: "video_likes",
    categories: "video_categories",
    tags: "video_tags",
    folded_text_column: "description_folded",
    body_columns: "i.description, i.video_url, i.duration_seconds, i.is_short",
};

pub fn tables(kind: ContentKind) -> &'static KindTables {
    match kind {
        ContentKind::Post => &POST_TABLES,
        ContentKind::Video => &VIDEO_TABLES,
    }
}

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

pub(crate) fn from_unix(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn select_items(t: &KindTables) -> String {
    format!(
        r#"
        SELECT i.id, i.title, i.thumbnail_url, i.published_at, i.is_premium, i.status,
               {body},
               e.id AS expert_id, e.full_name AS expert_name,
               e.specialization AS expert_specialization,
               COALESCE(s.view_count, 0) AS view_count,
               COALESCE(s.like_count, 0) AS like_count,
               COALESCE(s.updated_at, 0) AS stats_updated_at
        FROM {items} i
        LEFT JOIN {stats} s ON s.item_id = i.id
        LEFT JOIN experts e ON e.id = i.expert_id
        "#,
        body = t.body_columns,
        items = t.items,
        stats = t.stats,
    )
}

fn row_to_item(kind: ContentKind, row: &SqliteRow) -> Result<ContentItem> {
    let status: String = row.try_get("status")?;
    let status: LifecycleStatus = status.parse().map_err(anyhow::Error::msg)?;

    let expert = match row.try_get::<Option<i64>, _>("expert_id")? {
        Some(expert_id) => Some(Expert {
            expert_id,
            full_name: row.try_get("expert_name")?,
            specialization: row.try_get("expert_specialization")?,
        }),
        None => None,
    };

    let body = match kind {
        ContentKind::Post => ContentBody::Post {
            summary: row.try_get("summary")?,
            body: row.try_get("body")?,
        },
        ContentKind::Video => ContentBody::Video {
            description: row.try_get("description")?,
            duration_seconds: row.try_get("duration_seconds")?,
            is_short: row.try_get("is_short")?,
            video_url: row.try_get("video_url")?,
        },
    };

    Ok(ContentItem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        thumbnail_url: row.try_get("thumbnail_url")?,
        published_at: row
            .try_get::<Option<i64>, _>("published_at")?
            .map(from_unix),
        is_premium: row.try_get("is_premium")?,
        status,
        expert,
        stats: Stats {
            view_count: row.try_get("view_count")?,
            like_count: row.try_get("like_count")?,
            updated_at: from_unix(row.try_get("stats_updated_at")?),
        },
        body,
    })
}

fn row_to_stats(row: &SqliteRow) -> Result<Stats> {
    Ok(Stats {
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        updated_at: from_unix(row.try_get("updated_at")?),
    })
}

/// Escapes `LIKE` wildcards so user text matches literally.
fn like_pattern(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, kind: ContentKind, filter: &ItemFilter) {
    let t = tables(kind);
    qb.push(" WHERE i.status = 'published'");

    if let Some(text) = &filter.text {
        let pattern = like_pattern(text);
        qb.push(" AND (i.title_folded LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\'");
        if !filter.title_only {
            qb.push(" OR COALESCE(i.")
                .push(t.folded_text_column)
                .push(", '') LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }

    if let Some(premium) = filter.premium {
        qb.push(" AND i.is_premium = ").push_bind(premium);
    }

    if let Some(short) = filter.is_short {
        match kind {
            ContentKind::Video => {
                qb.push(" AND i.is_short = ").push_bind(short);
            }
            // Posts have no short form.
            ContentKind::Post => {
                qb.push(" AND 0");
            }
        }
    }

    if let Some(tag) = &filter.tag {
        qb.push(format!(
            " AND EXISTS (SELECT 1 FROM {junction} jt JOIN tags t ON t.id = jt.tag_id \
             WHERE jt.item_id = i.id AND t.name = ",
            junction = t.tags
        ))
        .push_bind(tag.clone())
        .push(")");
    }
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Trending => {
            " ORDER BY (COALESCE(s.like_count, 0) + COALESCE(s.view_count, 0)) DESC, \
             i.published_at IS NULL, i.published_at DESC, i.id DESC"
        }
        SortOrder::Newest => " ORDER BY i.published_at IS NULL, i.published_at DESC, i.id DESC",
        SortOrder::MostViewed => {
            " ORDER BY COALESCE(s.view_count, 0) DESC, \
             i.published_at IS NULL, i.published_at DESC, i.id DESC"
        }
        SortOrder::MostLiked => {
            " ORDER BY COALESCE(s.like_count, 0) DESC, \
             i.published_at IS NULL, i.published_at DESC, i.id DESC"
        }
    }
}

/// `UPDATE ... RETURNING` on one counter, clamped at zero.
async fn update_counter<'e, E>(
    executor: E,
    key: ItemKey,
    field: CounterField,
    delta: i64,
    now: DateTime<Utc>,
) -> Result<Option<Stats>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "UPDATE {stats} SET {col} = MAX({col} + ?, 0), updated_at = ? WHERE item_id = ? \
         RETURNING view_count, like_count, updated_at",
        stats = tables(key.kind).stats,
        col = field.column(),
    );
    let row = sqlx::query(&sql)
        .bind(delta)
        .bind(now.timestamp())
        .bind(key.id)
        .fetch_optional(executor)
        .await?;
    row.as_ref().map(row_to_stats).transpose()
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_item(&self, key: ItemKey) -> Result<Option<ContentItem>> {
        let sql = format!("{} WHERE i.id = ?", select_items(tables(key.kind)));
        let row = sqlx::query(&sql)
            .bind(key.id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref()
            .map(|r| row_to_item(key.kind, r))
            .transpose()
            .with_context(|| format!("Failed to decode {}", key))
    }

    async fn count_items(&self, kind: ContentKind, filter: &ItemFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT COUNT(*) FROM {} i",
            tables(kind).items
        ));
        push_filter(&mut qb, kind, filter);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn fetch_items(
        &self,
        kind: ContentKind,
        filter: &ItemFilter,
        sort: SortOrder,
        window: Option<Window>,
    ) -> Result<Vec<ContentItem>> {
        let mut qb = QueryBuilder::<Sqlite>::new(select_items(tables(kind)));
        push_filter(&mut qb, kind, filter);
        qb.push(order_clause(sort));
        if let Some(w) = window {
            qb.push(" LIMIT ")
                .push_bind(w.limit)
                .push(" OFFSET ")
                .push_bind(w.offset);
        }
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_item(kind, r)).collect()
    }

    async fn category_names(&self, key: ItemKey) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT c.name FROM categories c JOIN {junction} jc ON jc.category_id = c.id \
             WHERE jc.item_id = ? ORDER BY c.name",
            junction = tables(key.kind).categories,
        );
        let names: Vec<String> = sqlx::query_scalar(&sql)
            .bind(key.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    async fn category_ids(&self, key: ItemKey) -> Result<Vec<i64>> {
        let t = tables(key.kind);
        let sql = format!(
            "SELECT jc.category_id FROM {junction} jc JOIN {items} i ON i.id = jc.item_id \
             WHERE jc.item_id = ? AND i.status = 'published' ORDER BY jc.category_id",
            junction = t.categories,
            items = t.items,
        );
        let ids: Vec<i64> = sqlx::query_scalar(&sql)
            .bind(key.id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn items_in_categories(
        &self,
        kind: ContentKind,
        category_ids: &[i64],
        exclude_id: Option<i64>,
    ) -> Result<Vec<ContentItem>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let t = tables(kind);
        let mut qb = QueryBuilder::<Sqlite>::new(select_items(t));
        qb.push(format!(
            " WHERE i.status = 'published' AND i.id IN \
             (SELECT jc.item_id FROM {junction} jc WHERE jc.category_id IN (",
            junction = t.categories
        ));
        let mut ids = qb.separated(", ");
        for id in category_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated("))");
        if let Some(exclude) = exclude_id {
            qb.push(" AND i.id != ").push_bind(exclude);
        }
        qb.push(order_clause(SortOrder::Newest));
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_item(kind, r)).collect()
    }

    async fn liked_item_ids(
        &self,
        kind: ContentKind,
        user_id: i64,
        item_ids: &[i64],
    ) -> Result<Vec<i64>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT item_id FROM {} WHERE user_id = ",
            tables(kind).likes
        ));
        qb.push_bind(user_id).push(" AND item_id IN (");
        let mut ids = qb.separated(", ");
        for id in item_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
        let liked: Vec<i64> = qb.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(liked)
    }

    async fn like_exists(&self, key: ItemKey, user_id: i64) -> Result<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ? AND item_id = ?)",
            tables(key.kind).likes
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(key.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn increment_counter(
        &self,
        key: ItemKey,
        field: CounterField,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>> {
        update_counter(&self.pool, key, field, delta, now).await
    }

    async fn insert_like(
        &self,
        key: ItemKey,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO {} (user_id, item_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, item_id) DO NOTHING",
            tables(key.kind).likes
        );
        let inserted = sqlx::query(&sql)
            .bind(user_id)
            .bind(key.id)
            .bind(now.timestamp())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if inserted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let Some(stats) = update_counter(&mut *tx, key, CounterField::Likes, 1, now).await? else {
            tx.rollback().await?;
            anyhow::bail!("stats row missing for {}", key);
        };
        tx.commit().await?;
        Ok(Some(stats))
    }

    async fn delete_like(
        &self,
        key: ItemKey,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Stats>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "DELETE FROM {} WHERE user_id = ? AND item_id = ?",
            tables(key.kind).likes
        );
        let deleted = sqlx::query(&sql)
            .bind(user_id)
            .bind(key.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let Some(stats) = update_counter(&mut *tx, key, CounterField::Likes, -1, now).await? else {
            tx.rollback().await?;
            anyhow::bail!("stats row missing for {}", key);
        };
        tx.commit().await?;
        Ok(Some(stats))
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, slug FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|r| {
                Ok(Tag {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    slug: r.try_get("slug")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rose"), "%rose%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_tables_differ_by_kind() {
        assert_eq!(tables(ContentKind::Post).likes, "post_likes");
        assert_eq!(tables(ContentKind::Video).stats, "video_stats");
    }
}
