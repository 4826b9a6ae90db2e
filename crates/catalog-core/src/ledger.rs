//! Stats ledger: view counting and the toggle-like state machine.
//!
//! Every counter change goes through the store as a single store-evaluated
//! statement. The like toggle never acts on a stale existence check: the
//! insert and delete are each guarded by the `(user, item)` key, and a
//! guard failure means another caller changed the pair in between, so the
//! ledger re-reads and tries again.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{ItemKey, LikeToggle, Stats};
use crate::store::{CounterField, Store};

/// Default bound on like-toggle attempts before giving up.
pub const DEFAULT_LIKE_MAX_ATTEMPTS: u32 = 3;

pub struct StatsLedger<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    max_attempts: u32,
}

impl<S: Store> Clone for StatsLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            clock: self.clock.clone(),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S: Store> StatsLedger<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            max_attempts: DEFAULT_LIKE_MAX_ATTEMPTS,
        }
    }

    /// Bound on conflict retries for [`toggle_like`](Self::toggle_like).
    /// Values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Adds one view. Not deduplicated.
    ///
    /// Returns the stats after the increment. An item without a stats row
    /// is left untouched and yields `None`.
    pub async fn record_view(&self, key: ItemKey) -> CatalogResult<Option<Stats>> {
        let stats = self
            .store
            .increment_counter(key, CounterField::Views, 1, self.clock.now())
            .await?;
        if stats.is_none() {
            warn!(item = %key, "no stats row; view not recorded");
        }
        Ok(stats)
    }

    /// Flips the like state of `(key, user_id)`.
    ///
    /// Fails with [`CatalogError::NotFound`] when the item is absent or not
    /// published. Returns the new state and the like count after the flip.
    pub async fn toggle_like(&self, key: ItemKey, user_id: i64) -> CatalogResult<LikeToggle> {
        let item = self.store.find_item(key).await?;
        if !item.is_some_and(|i| i.is_published()) {
            return Err(CatalogError::NotFound(key));
        }

        for attempt in 1..=self.max_attempts {
            let now = self.clock.now();
            let liked = self.store.like_exists(key, user_id).await?;
            let outcome = if liked {
                self.store.delete_like(key, user_id, now).await?
            } else {
                self.store.insert_like(key, user_id, now).await?
            };
            match outcome {
                Some(stats) => {
                    return Ok(LikeToggle {
                        liked: !liked,
                        like_count: stats.like_count,
                    })
                }
                None => {
                    debug!(item = %key, user_id, attempt, "like toggle lost a race; retrying");
                }
            }
        }

        warn!(item = %key, user_id, attempts = self.max_attempts, "like toggle gave up");
        Err(CatalogError::StoreUnavailable(anyhow::anyhow!(
            "like toggle for {} by user {} kept conflicting after {} attempts",
            key,
            user_id,
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::LifecycleStatus;
    use crate::store::memory::InMemoryStore;
    use crate::test_support::{post, video, with_stats, with_status};
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (Arc<InMemoryStore>, Arc<FixedClock>, StatsLedger<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let ledger = StatsLedger::new(store.clone(), clock.clone());
        (store, clock, ledger)
    }

    #[tokio::test]
    async fn test_toggle_like_flips_and_restores() {
        let (store, _clock, ledger) = setup();
        store.insert_item(with_stats(post(42, "Rose care basics", 0), 100, 3));
        let key = ItemKey::post(42);

        let first = ledger.toggle_like(key, 7).await.unwrap();
        assert_eq!(
            first,
            LikeToggle {
                liked: true,
                like_count: 4
            }
        );
        assert!(store.has_like(key, 7));

        let second = ledger.toggle_like(key, 7).await.unwrap();
        assert_eq!(
            second,
            LikeToggle {
                liked: false,
                like_count: 3
            }
        );
        assert!(!store.has_like(key, 7));
        assert_eq!(store.stats(key).unwrap().view_count, 100);
    }

    #[tokio::test]
    async fn test_toggle_like_rejects_unpublished_and_missing() {
        let (store, _clock, ledger) = setup();
        store.insert_item(with_status(post(9, "Unfinished", 0), LifecycleStatus::Draft));

        let err = ledger.toggle_like(ItemKey::post(9), 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        let err = ledger.toggle_like(ItemKey::video(9), 1).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert_eq!(store.like_rows(ItemKey::post(9)), 0);
    }

    #[tokio::test]
    async fn test_unlike_clamps_at_zero() {
        let (store, _clock, ledger) = setup();
        // Like rows present while the counter has drifted to zero.
        store.insert_item(post(1, "Clamped", 0));
        ledger.toggle_like(ItemKey::post(1), 5).await.unwrap();
        store.insert_item(post(1, "Clamped", 0));

        let toggle = ledger.toggle_like(ItemKey::post(1), 5).await.unwrap();
        assert!(!toggle.liked);
        assert_eq!(toggle.like_count, 0);
    }

    #[tokio::test]
    async fn test_record_view_stamps_clock() {
        let (store, clock, ledger) = setup();
        store.insert_item(with_stats(post(3, "Viewed", 0), 10, 0));
        clock.advance(Duration::minutes(5));

        let stats = ledger.record_view(ItemKey::post(3)).await.unwrap().unwrap();
        assert_eq!(stats.view_count, 11);
        assert_eq!(stats.updated_at, clock.now());
    }

    #[tokio::test]
    async fn test_record_view_without_stats_is_noop() {
        let (store, _clock, ledger) = setup();
        store.insert_item(with_stats(post(4, "Orphaned", 0), 10, 0));
        store.drop_stats(ItemKey::post(4));

        assert!(ledger.record_view(ItemKey::post(4)).await.unwrap().is_none());
        assert!(store.stats(ItemKey::post(4)).is_none());
    }

    #[tokio::test]
    async fn test_posts_and_videos_with_same_id_are_separate() {
        let (store, _clock, ledger) = setup();
        store.insert_item(post(5, "Shared id", 0));
        store.insert_item(video(5, "Shared id", 0, 60, true));

        ledger.toggle_like(ItemKey::post(5), 1).await.unwrap();
        assert_eq!(store.stats(ItemKey::post(5)).unwrap().like_count, 1);
        assert_eq!(store.stats(ItemKey::video(5)).unwrap().like_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_by_distinct_users() {
        let (store, _clock, ledger) = setup();
        store.insert_item(post(8, "Popular", 0));
        let key = ItemKey::post(8);

        let mut handles = Vec::new();
        for user in 1..=20 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.toggle_like(key, user).await }));
        }
        for h in handles {
            assert!(h.await.unwrap().unwrap().liked);
        }
        assert_eq!(store.stats(key).unwrap().like_count, 20);
        assert_eq!(store.like_rows(key), 20);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_by_one_user_net_out() {
        let (store, _clock, ledger) = setup();
        store.insert_item(with_stats(post(8, "Contested", 0), 0, 2));
        let key = ItemKey::post(8);

        let a = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.toggle_like(key, 7).await })
        };
        let b = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.toggle_like(key, 7).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        // Every attempt either flips the pair or retries; with only two
        // contenders both flips land.
        let flips = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(flips, 2);
        assert_eq!(store.stats(key).unwrap().like_count, 2);
        assert!(!store.has_like(key, 7));
    }
}
