// Bloomstore - flower storefront core with wallet payments on Sepolia

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod models;
pub mod payment;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-exports for convenience
pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use checkout::Checkout;
pub use config::Config;
pub use payment::PaymentGateway;
pub use types::{StoreError, StoreResult};
pub use wallet::WalletSession;
