//! Core data model for the content catalog.
//!
//! A content item is either a post or a video. Both share the fields the
//! query engine filters and sorts on (title, publication time, premium
//! flag, stats); the variant-specific payload lives in [`ContentBody`].
//!
//! The response shapes serialized to API callers are defined here as well,
//! so every frontend (HTTP, CLI) renders the same JSON.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two content types served by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Video,
}

impl ContentKind {
    pub const ALL: [ContentKind; 2] = [ContentKind::Post, ContentKind::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Video => "video",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    /// Accepts both the singular and the plural path segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" | "posts" => Ok(ContentKind::Post),
            "video" | "videos" => Ok(ContentKind::Video),
            other => Err(format!(
                "unknown content type: '{}'. Use posts or videos.",
                other
            )),
        }
    }
}

/// Identity of a content item: kind and numeric id together.
///
/// Post 5 and video 5 are different items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: ContentKind,
    pub id: i64,
}

impl ItemKey {
    pub fn new(kind: ContentKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn post(id: i64) -> Self {
        Self::new(ContentKind::Post, id)
    }

    pub fn video(id: i64) -> Self {
        Self::new(ContentKind::Video, id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Lifecycle status. Only `Published` items are visible to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Draft,
    Published,
    Archived,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Draft => "draft",
            LifecycleStatus::Published => "published",
            LifecycleStatus::Archived => "archived",
        }
    }
}

impl FromStr for LifecycleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(LifecycleStatus::Draft),
            "published" => Ok(LifecycleStatus::Published),
            "archived" => Ok(LifecycleStatus::Archived),
            other => Err(format!("unknown lifecycle status: '{}'", other)),
        }
    }
}

/// View and like counters, one-to-one with a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub view_count: i64,
    pub like_count: i64,
    pub updated_at: DateTime<Utc>,
}

impl Stats {
    pub fn zeroed(now: DateTime<Utc>) -> Self {
        Self {
            view_count: 0,
            like_count: 0,
            updated_at: now,
        }
    }

    /// Trending score: likes plus views.
    pub fn engagement(&self) -> i64 {
        self.like_count.saturating_add(self.view_count)
    }
}

/// Expert attribution on a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub expert_id: i64,
    pub full_name: String,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// Variant-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBody {
    Post {
        summary: Option<String>,
        body: Option<String>,
    },
    Video {
        description: Option<String>,
        duration_seconds: i64,
        is_short: bool,
        video_url: String,
    },
}

/// A post or a video with its stats and attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: i64,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub is_premium: bool,
    pub status: LifecycleStatus,
    pub expert: Option<Expert>,
    pub stats: Stats,
    pub body: ContentBody,
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self.body {
            ContentBody::Post { .. } => ContentKind::Post,
            ContentBody::Video { .. } => ContentKind::Video,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind(), self.id)
    }

    pub fn is_published(&self) -> bool {
        self.status == LifecycleStatus::Published
    }

    /// The secondary text searched alongside the title: a post's summary or
    /// a video's description.
    pub fn searchable_text(&self) -> Option<&str> {
        match &self.body {
            ContentBody::Post { summary, .. } => summary.as_deref(),
            ContentBody::Video { description, .. } => description.as_deref(),
        }
    }

    pub fn is_short(&self) -> Option<bool> {
        match self.body {
            ContentBody::Video { is_short, .. } => Some(is_short),
            ContentBody::Post { .. } => None,
        }
    }

    pub fn duration(&self) -> Option<String> {
        match self.body {
            ContentBody::Video {
                duration_seconds, ..
            } => Some(format_duration(duration_seconds)),
            ContentBody::Post { .. } => None,
        }
    }
}

/// Formats a duration as `M:SS`, or `H:MM:SS` once it reaches an hour.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

// ============ Response shapes ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewerState {
    pub liked: bool,
}

/// One row of a single-kind listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub is_premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_short: Option<bool>,
    pub expert: Option<Expert>,
    pub viewer_state: ViewerState,
}

impl ItemSummary {
    pub fn from_item(item: ContentItem, liked: bool) -> Self {
        Self {
            id: item.id,
            kind: item.kind(),
            duration: item.duration(),
            is_short: item.is_short(),
            title: item.title,
            thumbnail_url: item.thumbnail_url,
            view_count: item.stats.view_count,
            like_count: item.stats.like_count,
            published_at: item.published_at,
            is_premium: item.is_premium,
            expert: item.expert,
            viewer_state: ViewerState { liked },
        }
    }
}

/// Variant content of a detail response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum DetailContent {
    Post {
        summary: Option<String>,
        body: Option<String>,
    },
    Video {
        description: Option<String>,
        video_url: String,
        duration: String,
        duration_seconds: i64,
        is_short: bool,
    },
}

impl From<ContentBody> for DetailContent {
    fn from(body: ContentBody) -> Self {
        match body {
            ContentBody::Post { summary, body } => DetailContent::Post { summary, body },
            ContentBody::Video {
                description,
                duration_seconds,
                is_short,
                video_url,
            } => DetailContent::Video {
                description,
                video_url,
                duration: format_duration(duration_seconds),
                duration_seconds,
                is_short,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetail {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub categories: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub like_count: i64,
    pub is_premium: bool,
    pub expert: Option<Expert>,
    pub content: DetailContent,
    pub viewer_state: ViewerState,
}

/// Kind-tagged projection shared by search and related content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedItem {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub published_at: Option<DateTime<Utc>>,
}

impl MixedItem {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.kind, self.id)
    }
}

impl From<ContentItem> for MixedItem {
    fn from(item: ContentItem) -> Self {
        Self {
            id: item.id,
            kind: item.kind(),
            duration: item.duration(),
            title: item.title,
            thumbnail_url: item.thumbnail_url,
            view_count: item.stats.view_count,
            like_count: item.stats.like_count,
            published_at: item.published_at,
        }
    }
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: i64,
}

/// Tag listing, ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagList {
    pub items: Vec<Tag>,
}
