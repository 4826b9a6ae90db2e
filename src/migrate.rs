//! Idempotent schema creation.
//!
//! Posts and videos each get their own item table plus four child tables
//! (stats, likes, category and tag junctions). Child tables key on
//! `item_id` in both families, so queries differ only by table name.
//! Everything cascades from the item; expert references are nulled.
//!
//! Searchable text is also stored in `*_folded` columns, lowercased with
//! [`catalog_core::store::fold_text`]. SQLite's `LOWER` only folds ASCII,
//! so text search matches against these columns instead.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::{tables, KindTables};
use catalog_core::models::ContentKind;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    info!(db = %config.db.path.display(), "schema up to date");
    Ok(())
}

/// Creates every table and index that does not exist yet.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS experts (
            id INTEGER PRIMARY KEY,
            full_name TEXT NOT NULL,
            specialization TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            title_folded TEXT NOT NULL DEFAULT '',
            thumbnail_url TEXT,
            summary TEXT,
            summary_folded TEXT,
            body TEXT,
            published_at INTEGER,
            is_premium INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'published', 'archived')),
            expert_id INTEGER REFERENCES experts(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            title_folded TEXT NOT NULL DEFAULT '',
            thumbnail_url TEXT,
            description TEXT,
            description_folded TEXT,
            video_url TEXT NOT NULL,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            is_short INTEGER NOT NULL DEFAULT 0,
            published_at INTEGER,
            is_premium INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'published', 'archived')),
            expert_id INTEGER REFERENCES experts(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for kind in ContentKind::ALL {
        create_child_tables(pool, tables(kind))
            .await
            .with_context(|| format!("Failed to create {} tables", kind))?;
    }

    Ok(())
}

async fn create_child_tables(pool: &SqlitePool, t: &KindTables) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {stats} (
            item_id INTEGER PRIMARY KEY REFERENCES {items}(id) ON DELETE CASCADE,
            view_count INTEGER NOT NULL DEFAULT 0 CHECK (view_count >= 0),
            like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
            updated_at INTEGER NOT NULL
        )
        "#,
        stats = t.stats,
        items = t.items,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {likes} (
            user_id INTEGER NOT NULL,
            item_id INTEGER NOT NULL REFERENCES {items}(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (user_id, item_id)
        )
        "#,
        likes = t.likes,
        items = t.items,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {junction} (
            item_id INTEGER NOT NULL REFERENCES {items}(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            PRIMARY KEY (item_id, category_id)
        )
        "#,
        junction = t.categories,
        items = t.items,
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {junction} (
            item_id INTEGER NOT NULL REFERENCES {items}(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (item_id, tag_id)
        )
        "#,
        junction = t.tags,
        items = t.items,
    ))
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{items}_status_published ON {items}(status, published_at DESC)",
        items = t.items,
    ))
    .execute(pool)
    .await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{likes}_item ON {likes}(item_id)",
        likes = t.likes,
    ))
    .execute(pool)
    .await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{junction}_category ON {junction}(category_id)",
        junction = t.categories,
    ))
    .execute(pool)
    .await?;

    Ok(())
}
