//! Item builders shared by the engine tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{ContentBody, ContentItem, LifecycleStatus, Stats};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Published post, `published_at` is `day` days after the base time.
pub fn post(id: i64, title: &str, day: i64) -> ContentItem {
    ContentItem {
        id,
        title: title.to_string(),
        thumbnail_url: Some(format!("https://cdn.example/p{}.jpg", id)),
        published_at: Some(base_time() + Duration::days(day)),
        is_premium: false,
        status: LifecycleStatus::Published,
        expert: None,
        stats: Stats::zeroed(base_time()),
        body: ContentBody::Post {
            summary: None,
            body: Some(format!("body of {}", title)),
        },
    }
}

/// Published video, `published_at` is `day` days after the base time.
pub fn video(id: i64, title: &str, day: i64, duration_seconds: i64, is_short: bool) -> ContentItem {
    ContentItem {
        id,
        title: title.to_string(),
        thumbnail_url: None,
        published_at: Some(base_time() + Duration::days(day)),
        is_premium: false,
        status: LifecycleStatus::Published,
        expert: None,
        stats: Stats::zeroed(base_time()),
        body: ContentBody::Video {
            description: None,
            duration_seconds,
            is_short,
            video_url: format!("https://cdn.example/v{}.mp4", id),
        },
    }
}

pub fn with_stats(mut item: ContentItem, views: i64, likes: i64) -> ContentItem {
    item.stats.view_count = views;
    item.stats.like_count = likes;
    item
}

pub fn with_status(mut item: ContentItem, status: LifecycleStatus) -> ContentItem {
    item.status = status;
    item
}
