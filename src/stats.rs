//! Catalog statistics overview.
//!
//! Prints item counts by status, counter totals, and like-row totals per
//! kind. Used by `catalog stats` to check that seeding and traffic landed
//! where expected; a like total that differs from the like-row count means
//! the counters have drifted.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::tables;
use catalog_core::models::ContentKind;

/// Per-kind breakdown.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct KindStats {
    pub published: i64,
    pub draft: i64,
    pub archived: i64,
    pub views: i64,
    pub likes: i64,
    pub like_rows: i64,
}

impl KindStats {
    pub fn total(&self) -> i64 {
        self.published + self.draft + self.archived
    }
}

pub async fn kind_stats(pool: &SqlitePool, kind: ContentKind) -> Result<KindStats> {
    let t = tables(kind);
    let mut stats = KindStats::default();

    let rows = sqlx::query(&format!(
        "SELECT status, COUNT(*) AS n FROM {} GROUP BY status",
        t.items
    ))
    .fetch_all(pool)
    .await?;
    for row in &rows {
        let status: String = row.get("status");
        let n: i64 = row.get("n");
        match status.as_str() {
            "published" => stats.published = n,
            "draft" => stats.draft = n,
            "archived" => stats.archived = n,
            _ => {}
        }
    }

    let totals = sqlx::query(&format!(
        "SELECT COALESCE(SUM(view_count), 0) AS views, COALESCE(SUM(like_count), 0) AS likes FROM {}",
        t.stats
    ))
    .fetch_one(pool)
    .await?;
    stats.views = totals.get("views");
    stats.likes = totals.get("likes");

    stats.like_rows = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", t.likes))
        .fetch_one(pool)
        .await?;

    Ok(stats)
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let tags: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
        .fetch_one(&pool)
        .await?;
    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await?;
    let experts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM experts")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Content Catalog Stats");
    println!("=====================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Experts:     {}", experts);
    println!("  Categories:  {}", categories);
    println!("  Tags:        {}", tags);
    println!();
    println!(
        "  {:<8} {:>9} {:>6} {:>9} {:>10} {:>8} {:>10}",
        "TYPE", "PUBLISHED", "DRAFT", "ARCHIVED", "VIEWS", "LIKES", "LIKE ROWS"
    );
    println!("  {}", "-".repeat(66));
    for kind in ContentKind::ALL {
        let s = kind_stats(&pool, kind).await?;
        println!(
            "  {:<8} {:>9} {:>6} {:>9} {:>10} {:>8} {:>10}",
            kind.as_str(),
            s.published,
            s.draft,
            s.archived,
            s.views,
            s.likes,
            s.like_rows
        );
    }
    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
