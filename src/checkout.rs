//! Checkout orchestration.
//!
//! Sequences wallet session, payment gateway and the two stores. Catalog
//! and cart are only touched after the payment is confirmed, so a failed
//! or rejected attempt leaves everything exactly as it was and the caller
//! can retry.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cart::CartStore;
use crate::catalog::CatalogStore;
use crate::models::OrderReceipt;
use crate::payment::PaymentGateway;
use crate::types::{StoreError, StoreResult, View};
use crate::wallet::WalletSession;

pub struct Checkout {
    session: Arc<WalletSession>,
    gateway: Arc<PaymentGateway>,
    cart: CartStore,
    catalog: CatalogStore,
}

impl Checkout {
    pub fn new(
        session: Arc<WalletSession>,
        gateway: Arc<PaymentGateway>,
        cart: CartStore,
        catalog: CatalogStore,
    ) -> Self {
        Self {
            session,
            gateway,
            cart,
            catalog,
        }
    }

    /// Pay for the current cart and, once the payment is confirmed, remove
    /// the purchased flowers from the catalog (each one is unique and sold
    /// exactly once), empty the cart and point the caller back at the
    /// landing view.
    pub async fn place_order(&self) -> StoreResult<OrderReceipt> {
        let signer = self
            .session
            .signer()
            .await
            .ok_or(StoreError::WalletNotConnected)?;

        let lines = self.cart.lines().await;
        if lines.is_empty() {
            return Err(StoreError::EmptyOrder);
        }

        // One payment unit per distinct flower, not per cart quantity.
        let item_count = lines.len();
        let receipt = self.gateway.pay(&signer, item_count).await?;

        let item_ids: Vec<u32> = lines.iter().map(|line| line.id).collect();
        let ids: HashSet<u32> = item_ids.iter().copied().collect();
        self.catalog.remove_by_ids(&ids).await;
        self.cart.clear().await;
        info!(
            "Order complete: {} flower(s) sold in tx {:#x}",
            item_ids.len(),
            receipt.tx_hash
        );

        Ok(OrderReceipt {
            order_id: Uuid::new_v4(),
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            paid_wei: self.gateway.total_for(item_count),
            item_ids,
            created_at: Utc::now(),
            destination: View::Home,
        })
    }
}
