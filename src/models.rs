use chrono::{DateTime, Utc};
use ethers::types::{Address, TxHash, U256};

use crate::types::View;

/// A purchasable flower. Immutable once loaded; the catalog only ever
/// removes items from its available set.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CatalogItem {
    pub id: u32,
    pub title: String,
    /// Unit price in whole rupees.
    pub price: u64,
    pub image: String,
    pub rating: f32,
    pub origin: String,
    pub meaning: String,
}

/// One cart entry. There is at most one line per catalog id; a line whose
/// quantity reaches zero is removed, never kept at zero.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CartLine {
    pub id: u32,
    pub title: String,
    pub price: u64,
    pub image: String,
    pub qty: u32,
}

impl CartLine {
    pub fn line_total(&self) -> u64 {
        self.price * self.qty as u64
    }
}

impl From<&CatalogItem> for CartLine {
    fn from(item: &CatalogItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            price: item.price,
            image: item.image.clone(),
            qty: 1,
        }
    }
}

/// Outcome of a mined payment transaction.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// False when the transaction was included but reverted.
    pub succeeded: bool,
}

/// Owner and payment counter read from the payment contract.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContractInfo {
    pub owner: Address,
    pub total_payments: u64,
}

/// Final record of a confirmed checkout, handed to the caller for display
/// and navigation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrderReceipt {
    pub order_id: uuid::Uuid,
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub paid_wei: U256,
    pub item_ids: Vec<u32>,
    pub created_at: DateTime<Utc>,
    pub destination: View,
}
