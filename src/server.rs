//! HTTP server for the content catalog.
//!
//! A thin dispatcher: handlers parse path, query, and the identity header,
//! call into the engine, and serialize the result. No handler holds state
//! beyond the shared [`CatalogService`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/content/{type}` | Filtered, sorted page of one kind |
//! | `GET`  | `/content/{type}/{id}` | Item detail (counts a view) |
//! | `POST` | `/content/{type}/{id}/like` | Toggle the caller's like |
//! | `GET`  | `/content/{type}/{id}/related` | Items sharing a category |
//! | `GET`  | `/search` | Title search across posts and videos |
//! | `GET`  | `/tags` | All tags by name |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! `{type}` is `post`, `posts`, `video`, or `videos`. The caller identity is
//! the numeric `X-User-Id` header; a missing or unparseable value means an
//! anonymous caller.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid sort: bogus. ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `unauthorized` (401), `not_found` (404),
//! `internal` (500). Store failures are logged and reported without detail.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use catalog_core::aggregate::SearchResponse;
use catalog_core::catalog::ListQuery;
use catalog_core::error::CatalogError;
use catalog_core::models::{
    ContentKind, ItemDetail, ItemKey, ItemSummary, LikeToggle, MixedItem, TagList,
};
use catalog_core::page::Page;
use catalog_core::store::Store;

use crate::config::Config;
use crate::service::CatalogService;

/// Header carrying the resolved caller identity.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = CatalogService::open(config).await?;
    let bind_addr = config.server.bind.clone();

    let app = router(service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind = %bind_addr, "catalog server started");
    println!("Catalog server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// All routes over `service`, with CORS and request tracing.
pub fn router(service: CatalogService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/content/{kind}", get(handle_list))
        .route("/content/{kind}/{id}", get(handle_detail))
        .route("/content/{kind}/{id}/like", post(handle_like))
        .route("/content/{kind}/{id}/related", get(handle_related))
        .route("/search", get(handle_search))
        .route("/tags", get(handle_tags))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::InvalidArgument(message) => bad_request(message),
            CatalogError::NotFound(key) => ApiError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message: format!("{} not found", key),
            },
            CatalogError::Unauthorized => ApiError {
                status: StatusCode::UNAUTHORIZED,
                code: "unauthorized",
                message: format!("the {} header is required", USER_ID_HEADER),
            },
            CatalogError::StoreUnavailable(source) => {
                error!(error = ?source, "store failure");
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal",
                    message: "internal error".to_string(),
                }
            }
        }
    }
}

// ============ Request parsing ============

/// Identity from `X-User-Id`; anything unusable is anonymous.
fn viewer(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
}

fn parse_kind(raw: &str) -> Result<ContentKind, ApiError> {
    raw.parse::<ContentKind>().map_err(bad_request)
}

fn parse_key(kind: &str, id: &str) -> Result<ItemKey, ApiError> {
    let kind = parse_kind(kind)?;
    let id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| bad_request(format!("invalid id: '{}'", id)))?;
    Ok(ItemKey::new(kind, id))
}

/// Lenient integer parameter: malformed values fall back to the default.
fn int_param(params: &HashMap<String, String>, name: &str) -> Option<i64> {
    params.get(name).and_then(|v| v.trim().parse::<i64>().ok())
}

/// Strict boolean parameter: absent or blank is `None`, garbage is a 400.
fn bool_param(params: &HashMap<String, String>, name: &str) -> Result<Option<bool>, ApiError> {
    let Some(raw) = params.get(name).map(|v| v.trim()) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        _ => Err(bad_request(format!(
            "invalid {}: '{}'. Use true or false.",
            name, raw
        ))),
    }
}

fn text_param(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params.get(name).cloned()
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /content ============

async fn handle_list(
    State(service): State<CatalogService>,
    Path(kind): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<Page<ItemSummary>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let query = ListQuery {
        search: text_param(&params, "q"),
        sort: text_param(&params, "sort"),
        page: int_param(&params, "page"),
        page_size: int_param(&params, "pageSize"),
        premium: bool_param(&params, "premium")?,
        is_short: bool_param(&params, "isShort")?,
        tag: text_param(&params, "tag"),
    };
    let page = service.catalog.list(kind, &query, viewer(&headers)).await?;
    Ok(Json(page))
}

async fn handle_detail(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<ItemDetail>, ApiError> {
    let key = parse_key(&kind, &id)?;
    let detail = service.catalog.detail(key, viewer(&headers)).await?;
    Ok(Json(detail))
}

async fn handle_like(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<LikeToggle>, ApiError> {
    let key = parse_key(&kind, &id)?;
    let user_id = viewer(&headers).ok_or(CatalogError::Unauthorized)?;
    let toggle = service.ledger.toggle_like(key, user_id).await?;
    Ok(Json(toggle))
}

async fn handle_related(
    State(service): State<CatalogService>,
    Path((kind, id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<MixedItem>>, ApiError> {
    let key = parse_key(&kind, &id)?;
    let page = service
        .aggregator
        .related(
            key,
            int_param(&params, "page"),
            int_param(&params, "pageSize"),
        )
        .await?;
    Ok(Json(page))
}

// ============ GET /search ============

async fn handle_search(
    State(service): State<CatalogService>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let response = service
        .aggregator
        .search(
            params.get("q").map(String::as_str),
            int_param(&params, "page"),
            int_param(&params, "pageSize"),
        )
        .await?;
    Ok(Json(response))
}

// ============ GET /tags ============

async fn handle_tags(
    State(service): State<CatalogService>,
) -> Result<Json<TagList>, ApiError> {
    let items = service
        .store
        .list_tags()
        .await
        .map_err(CatalogError::from)?;
    Ok(Json(TagList { items }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_viewer_header_is_lenient() {
        let mut headers = HeaderMap::new();
        assert_eq!(viewer(&headers), None);
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" 7 "));
        assert_eq!(viewer(&headers), Some(7));
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(viewer(&headers), None);
    }

    #[test]
    fn test_int_params_fall_back() {
        let params: HashMap<String, String> = [
            ("page".to_string(), "two".to_string()),
            ("pageSize".to_string(), "5".to_string()),
        ]
        .into();
        assert_eq!(int_param(&params, "page"), None);
        assert_eq!(int_param(&params, "pageSize"), Some(5));
    }

    #[test]
    fn test_bool_params_are_strict() {
        let params: HashMap<String, String> = [
            ("premium".to_string(), "TRUE".to_string()),
            ("isShort".to_string(), "maybe".to_string()),
        ]
        .into();
        assert_eq!(bool_param(&params, "premium").unwrap(), Some(true));
        assert!(bool_param(&params, "isShort").is_err());
        assert_eq!(bool_param(&params, "missing").unwrap(), None);
    }

    #[test]
    fn test_error_mapping() {
        let err = ApiError::from(CatalogError::NotFound(ItemKey::post(3)));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = ApiError::from(CatalogError::StoreUnavailable(anyhow::anyhow!("disk gone")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("disk"));
        let err = parse_key("podcasts", "1").unwrap_err();
        assert_eq!(err.code, "bad_request");
    }
}
