use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{CartLine, CatalogItem};

/// Shopping cart handle. Clones share the same underlying lines; the cart
/// lives for the whole application session and only the methods here
/// mutate it.
///
/// `count` and `total` are recomputed from the lines on every read so they
/// can never drift from the actual contents.
#[derive(Clone, Default)]
pub struct CartStore {
    inner: Arc<RwLock<Vec<CartLine>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `item`: bump an existing line or append a new qty-1
    /// line in insertion order.
    pub async fn add(&self, item: &CatalogItem) {
        let mut lines = self.inner.write().await;
        match lines.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.qty += 1,
            None => lines.push(CartLine::from(item)),
        }
    }

    /// Drop the whole line for `id`, whatever its quantity.
    pub async fn remove(&self, id: u32) {
        self.inner.write().await.retain(|line| line.id != id);
    }

    /// Take one unit off the line for `id`. The line disappears when its
    /// quantity reaches zero; an absent id is a no-op.
    pub async fn decrement(&self, id: u32) {
        let mut lines = self.inner.write().await;
        if let Some(line) = lines.iter_mut().find(|line| line.id == id) {
            line.qty -= 1;
        }
        lines.retain(|line| line.qty > 0);
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn lines(&self) -> Vec<CartLine> {
        self.inner.read().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Number of distinct lines (one per catalog item).
    pub async fn line_count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Total units across all lines.
    pub async fn count(&self) -> u32 {
        self.inner.read().await.iter().map(|line| line.qty).sum()
    }

    /// Total price in whole rupees.
    pub async fn total(&self) -> u64 {
        self.inner
            .read()
            .await
            .iter()
            .map(|line| line.line_total())
            .sum()
    }

    pub async fn qty_of(&self, id: u32) -> u32 {
        self.inner
            .read()
            .await
            .iter()
            .find(|line| line.id == id)
            .map(|line| line.qty)
            .unwrap_or(0)
    }
}
