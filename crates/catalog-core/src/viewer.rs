//! Per-viewer liked-state resolution.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::CatalogResult;
use crate::models::ContentKind;
use crate::store::Store;

/// Resolves which of a batch of items the viewer likes, in one store call.
pub struct ViewerStateResolver<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for ViewerStateResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> ViewerStateResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Ids among `item_ids` that `viewer` has liked.
    ///
    /// Anonymous viewers and empty batches short-circuit without a query.
    pub async fn liked_ids(
        &self,
        kind: ContentKind,
        viewer: Option<i64>,
        item_ids: &[i64],
    ) -> CatalogResult<HashSet<i64>> {
        let Some(user_id) = viewer else {
            return Ok(HashSet::new());
        };
        if item_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let liked = self.store.liked_item_ids(kind, user_id, item_ids).await?;
        Ok(liked.into_iter().collect())
    }
}
