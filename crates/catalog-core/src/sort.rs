//! Sort policies for single-kind listings.
//!
//! Every policy is a total order: after its primary key it falls back to
//! publication time (newest first, undated items last) and finally to id
//! (descending), so offset pagination over a fixed snapshot never repeats
//! or skips an item.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CatalogError, CatalogResult};
use crate::models::ContentItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    /// Likes plus views, descending.
    #[default]
    Trending,
    /// Publication time, descending.
    Newest,
    /// View count, descending.
    MostViewed,
    /// Like count, descending.
    MostLiked,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::Trending,
        SortOrder::Newest,
        SortOrder::MostViewed,
        SortOrder::MostLiked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Trending => "TRENDING",
            SortOrder::Newest => "NEWEST",
            SortOrder::MostViewed => "MOST_VIEWED",
            SortOrder::MostLiked => "MOST_LIKED",
        }
    }

    /// Parses a caller-supplied sort token, case-insensitively.
    ///
    /// An absent or blank token selects [`SortOrder::Trending`]. Anything
    /// unrecognised is an [`CatalogError::InvalidArgument`].
    pub fn parse(token: Option<&str>) -> CatalogResult<SortOrder> {
        let token = match token.map(str::trim) {
            None | Some("") => return Ok(SortOrder::default()),
            Some(t) => t,
        };
        SortOrder::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| {
                CatalogError::invalid(format!(
                    "invalid sort: {}. Valid values: TRENDING, NEWEST, MOST_VIEWED, MOST_LIKED",
                    token
                ))
            })
    }

    /// Compares two items under this policy. `Less` means `a` comes first.
    pub fn compare(&self, a: &ContentItem, b: &ContentItem) -> Ordering {
        let primary = match self {
            SortOrder::Trending => b.stats.engagement().cmp(&a.stats.engagement()),
            SortOrder::Newest => Ordering::Equal,
            SortOrder::MostViewed => b.stats.view_count.cmp(&a.stats.view_count),
            SortOrder::MostLiked => b.stats.like_count.cmp(&a.stats.like_count),
        };
        primary
            .then_with(|| newest_first(a.published_at, b.published_at))
            .then_with(|| b.id.cmp(&a.id))
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication time descending with undated items after dated ones.
pub fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{base_time, post, with_stats};
    use chrono::Duration;

    /// Post published on March `day` 2024 (undated when `None`).
    fn item(id: i64, day: Option<u32>, views: i64, likes: i64) -> ContentItem {
        let mut item = with_stats(post(id, &format!("item {}", id), 0), views, likes);
        item.published_at = day.map(|d| base_time() + Duration::days(59 + i64::from(d)));
        item
    }

    fn order(sort: SortOrder, mut items: Vec<ContentItem>) -> Vec<i64> {
        items.sort_by(|a, b| sort.compare(a, b));
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_parse_defaults_to_trending() {
        assert_eq!(SortOrder::parse(None).unwrap(), SortOrder::Trending);
        assert_eq!(SortOrder::parse(Some("  ")).unwrap(), SortOrder::Trending);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(
            SortOrder::parse(Some("most_viewed")).unwrap(),
            SortOrder::MostViewed
        );
        assert_eq!(SortOrder::parse(Some("Newest")).unwrap(), SortOrder::Newest);
    }

    #[test]
    fn test_parse_rejects_unknown_token() {
        let err = SortOrder::parse(Some("bogus")).unwrap_err();
        match err {
            CatalogError::InvalidArgument(msg) => assert!(msg.contains("bogus")),
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_newest_puts_undated_last() {
        let items = vec![item(1, None, 0, 0), item(2, Some(5), 0, 0), item(3, Some(9), 0, 0)];
        assert_eq!(order(SortOrder::Newest, items), vec![3, 2, 1]);
    }

    #[test]
    fn test_trending_sums_likes_and_views() {
        let items = vec![
            item(1, Some(1), 10, 0),
            item(2, Some(2), 3, 9),
            item(3, Some(3), 5, 1),
        ];
        assert_eq!(order(SortOrder::Trending, items), vec![2, 1, 3]);
    }

    #[test]
    fn test_ties_break_on_publication_then_id() {
        let items = vec![
            item(1, Some(4), 7, 0),
            item(2, Some(8), 7, 0),
            item(3, Some(8), 7, 0),
        ];
        assert_eq!(order(SortOrder::MostViewed, items), vec![3, 2, 1]);
    }
}
