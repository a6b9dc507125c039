// In-memory catalog of purchasable flowers

pub mod seed;

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::CatalogItem;

/// Available-items handle, seeded once at startup. Items are only ever
/// removed; a sold flower never comes back (each one is unique).
#[derive(Clone, Default)]
pub struct CatalogStore {
    inner: Arc<RwLock<Vec<CatalogItem>>>,
}

impl CatalogStore {
    pub fn new(seed: Vec<CatalogItem>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(seed)),
        }
    }

    pub async fn available(&self) -> Vec<CatalogItem> {
        self.inner.read().await.clone()
    }

    pub async fn get(&self, id: u32) -> Option<CatalogItem> {
        self.inner
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop every item whose id is in `ids`. Idempotent: a second call
    /// with the same set changes nothing.
    pub async fn remove_by_ids(&self, ids: &HashSet<u32>) {
        self.inner
            .write()
            .await
            .retain(|item| !ids.contains(&item.id));
    }
}
