//! CLI query commands.
//!
//! Each command opens the configured database, runs one engine operation,
//! and prints the same JSON the HTTP server would return.

use anyhow::Result;
use serde::Serialize;

use catalog_core::catalog::ListQuery;
use catalog_core::models::{ContentKind, ItemKey, TagList};
use catalog_core::store::Store;

use crate::config::Config;
use crate::service::CatalogService;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_kind(raw: &str) -> Result<ContentKind> {
    raw.parse::<ContentKind>().map_err(anyhow::Error::msg)
}

pub async fn run_list(
    config: &Config,
    kind: &str,
    query: ListQuery,
    user: Option<i64>,
) -> Result<()> {
    let kind = parse_kind(kind)?;
    let service = CatalogService::open(config).await?;
    let page = service.catalog.list(kind, &query, user).await?;
    print_json(&page)?;
    service.close().await;
    Ok(())
}

pub async fn run_get(config: &Config, kind: &str, id: i64, user: Option<i64>) -> Result<()> {
    let key = ItemKey::new(parse_kind(kind)?, id);
    let service = CatalogService::open(config).await?;
    let detail = service.catalog.detail(key, user).await?;
    print_json(&detail)?;
    service.close().await;
    Ok(())
}

pub async fn run_like(config: &Config, kind: &str, id: i64, user: i64) -> Result<()> {
    let key = ItemKey::new(parse_kind(kind)?, id);
    let service = CatalogService::open(config).await?;
    let toggle = service.ledger.toggle_like(key, user).await?;
    print_json(&toggle)?;
    service.close().await;
    Ok(())
}

pub async fn run_search(
    config: &Config,
    query: &str,
    page: Option<i64>,
    page_size: Option<i64>,
) -> Result<()> {
    let service = CatalogService::open(config).await?;
    let response = service
        .aggregator
        .search(Some(query), page, page_size)
        .await?;
    print_json(&response)?;
    service.close().await;
    Ok(())
}

pub async fn run_related(
    config: &Config,
    kind: &str,
    id: i64,
    page: Option<i64>,
    page_size: Option<i64>,
) -> Result<()> {
    let key = ItemKey::new(parse_kind(kind)?, id);
    let service = CatalogService::open(config).await?;
    let related = service.aggregator.related(key, page, page_size).await?;
    print_json(&related)?;
    service.close().await;
    Ok(())
}

pub async fn run_tags(config: &Config) -> Result<()> {
    let service = CatalogService::open(config).await?;
    let items = service.store.list_tags().await?;
    print_json(&TagList { items })?;
    service.close().await;
    Ok(())
}
