//! JSON fixture loading.
//!
//! A fixture lists experts, categories, tags, posts, videos, and likes.
//! Rows are upserted by id in one transaction, so re-seeding the same file
//! is a no-op apart from refreshed fields. Like counts are never taken
//! from the fixture: each stats row starts at zero likes and is bumped once
//! per like row actually inserted, keeping the count equal to the rows.
//! Titles, summaries and descriptions are written twice: as given, and
//! folded for text search.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::Path;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::tables;
use catalog_core::models::{ContentKind, LifecycleStatus};
use catalog_core::store::fold_text;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Fixture {
    pub experts: Vec<ExpertRecord>,
    pub categories: Vec<TaxonomyRecord>,
    pub tags: Vec<TaxonomyRecord>,
    pub posts: Vec<PostRecord>,
    pub videos: Vec<VideoRecord>,
    pub likes: Vec<LikeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpertRecord {
    pub id: i64,
    pub full_name: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaxonomyRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Fields shared by posts and videos.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default = "default_status")]
    pub status: LifecycleStatus,
    #[serde(default)]
    pub expert_id: Option<i64>,
    #[serde(default)]
    pub categories: Vec<i64>,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub view_count: i64,
}

fn default_status() -> LifecycleStatus {
    LifecycleStatus::Published
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(flatten)]
    pub item: ItemRecord,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    #[serde(flatten)]
    pub item: ItemRecord,
    #[serde(default)]
    pub description: Option<String>,
    pub video_url: String,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub is_short: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRecord {
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub item_id: i64,
}

/// Row counts written by one seed run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub experts: usize,
    pub categories: usize,
    pub tags: usize,
    pub posts: usize,
    pub videos: usize,
    pub likes: usize,
}

pub fn read_fixture(path: &Path) -> Result<Fixture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fixture: {}", path.display()))
}

/// CLI entry point: load `path` into the configured database.
pub async fn run_seed(config: &Config, path: &Path) -> Result<()> {
    let fixture = read_fixture(path)?;
    let pool = db::connect(config).await?;
    let report = seed_pool(&pool, &fixture, Utc::now()).await?;
    pool.close().await;

    info!(fixture = %path.display(), ?report, "seed complete");
    println!("Seeded {}:", path.display());
    println!("  experts:    {}", report.experts);
    println!("  categories: {}", report.categories);
    println!("  tags:       {}", report.tags);
    println!("  posts:      {}", report.posts);
    println!("  videos:     {}", report.videos);
    println!("  likes:      {} new", report.likes);
    Ok(())
}

pub async fn seed_pool(
    pool: &SqlitePool,
    fixture: &Fixture,
    now: DateTime<Utc>,
) -> Result<SeedReport> {
    let mut tx = pool.begin().await?;
    let mut report = SeedReport::default();

    for e in &fixture.experts {
        sqlx::query(
            r#"
            INSERT INTO experts (id, full_name, specialization) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                full_name = excluded.full_name,
                specialization = excluded.specialization
            "#,
        )
        .bind(e.id)
        .bind(&e.full_name)
        .bind(&e.specialization)
        .execute(&mut *tx)
        .await?;
        report.experts += 1;
    }

    for (table, records, count) in [
        ("categories", &fixture.categories, &mut report.categories),
        ("tags", &fixture.tags, &mut report.tags),
    ] {
        let sql = format!(
            "INSERT INTO {} (id, name, slug) VALUES (?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, slug = excluded.slug",
            table
        );
        for r in records {
            sqlx::query(&sql)
                .bind(r.id)
                .bind(&r.name)
                .bind(&r.slug)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to seed {} {}", table, r.id))?;
            *count += 1;
        }
    }

    for p in &fixture.posts {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, title_folded, thumbnail_url, summary,
                               summary_folded, body, published_at, is_premium,
                               status, expert_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                title_folded = excluded.title_folded,
                thumbnail_url = excluded.thumbnail_url,
                summary = excluded.summary,
                summary_folded = excluded.summary_folded,
                body = excluded.body,
                published_at = excluded.published_at,
                is_premium = excluded.is_premium,
                status = excluded.status,
                expert_id = excluded.expert_id
            "#,
        )
        .bind(p.item.id)
        .bind(&p.item.title)
        .bind(fold_text(&p.item.title))
        .bind(&p.item.thumbnail_url)
        .bind(&p.summary)
        .bind(p.summary.as_deref().map(fold_text))
        .bind(&p.body)
        .bind(p.item.published_at.map(|t| t.timestamp()))
        .bind(p.item.is_premium)
        .bind(p.item.status.as_str())
        .bind(p.item.expert_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to seed post {}", p.item.id))?;
        seed_children(&mut tx, ContentKind::Post, &p.item, now).await?;
        report.posts += 1;
    }

    for v in &fixture.videos {
        sqlx::query(
            r#"
            INSERT INTO videos (id, title, title_folded, thumbnail_url, description,
                                description_folded, video_url, duration_seconds,
                                is_short, published_at, is_premium, status, expert_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                title_folded = excluded.title_folded,
                thumbnail_url = excluded.thumbnail_url,
                description = excluded.description,
                description_folded = excluded.description_folded,
                video_url = excluded.video_url,
                duration_seconds = excluded.duration_seconds,
                is_short = excluded.is_short,
                published_at = excluded.published_at,
                is_premium = excluded.is_premium,
                status = excluded.status,
                expert_id = excluded.expert_id
            "#,
        )
        .bind(v.item.id)
        .bind(&v.item.title)
        .bind(fold_text(&v.item.title))
        .bind(&v.item.thumbnail_url)
        .bind(&v.description)
        .bind(v.description.as_deref().map(fold_text))
        .bind(&v.video_url)
        .bind(v.duration_seconds)
        .bind(v.is_short)
        .bind(v.item.published_at.map(|t| t.timestamp()))
        .bind(v.item.is_premium)
        .bind(v.item.status.as_str())
        .bind(v.item.expert_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to seed video {}", v.item.id))?;
        seed_children(&mut tx, ContentKind::Video, &v.item, now).await?;
        report.videos += 1;
    }

    for like in &fixture.likes {
        let t = tables(like.kind);
        let inserted = sqlx::query(&format!(
            "INSERT INTO {} (user_id, item_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id, item_id) DO NOTHING",
            t.likes
        ))
        .bind(like.user_id)
        .bind(like.item_id)
        .bind(now.timestamp())
        .execute(&mut *tx)
        .await
        .with_context(|| {
            format!(
                "Failed to seed like of {} {} by user {}",
                like.kind, like.item_id, like.user_id
            )
        })?
        .rows_affected();
        if inserted > 0 {
            sqlx::query(&format!(
                "UPDATE {} SET like_count = like_count + 1 WHERE item_id = ?",
                t.stats
            ))
            .bind(like.item_id)
            .execute(&mut *tx)
            .await?;
            report.likes += 1;
        }
    }

    tx.commit().await?;
    Ok(report)
}

/// Stats row plus category and tag junctions of one item.
async fn seed_children(
    tx: &mut Transaction<'_, Sqlite>,
    kind: ContentKind,
    item: &ItemRecord,
    now: DateTime<Utc>,
) -> Result<()> {
    let t = tables(kind);

    sqlx::query(&format!(
        "INSERT INTO {} (item_id, view_count, like_count, updated_at) VALUES (?, ?, 0, ?) \
         ON CONFLICT(item_id) DO UPDATE SET view_count = excluded.view_count",
        t.stats
    ))
    .bind(item.id)
    .bind(item.view_count.max(0))
    .bind(now.timestamp())
    .execute(&mut **tx)
    .await?;

    for category_id in &item.categories {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (item_id, category_id) VALUES (?, ?)",
            t.categories
        ))
        .bind(item.id)
        .bind(*category_id)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to attach category {} to {} {}", category_id, kind, item.id))?;
    }

    for tag_id in &item.tags {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (item_id, tag_id) VALUES (?, ?)",
            t.tags
        ))
        .bind(item.id)
        .bind(*tag_id)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to attach tag {} to {} {}", tag_id, kind, item.id))?;
    }

    Ok(())
}
