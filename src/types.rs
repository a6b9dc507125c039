// Shared type definitions and the storefront error taxonomy

use ethers::types::TxHash;

/// Views the storefront can navigate between. Rendering and routing live
/// outside this crate; checkout only reports the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum View {
    Home,
    Cart,
    Checkout,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No compatible wallet found. Please install a browser wallet to continue.")]
    WalletUnavailable,

    #[error("Request was rejected by the user")]
    UserRejected,

    #[error("Could not switch to the required network: {0}")]
    NetworkSwitchFailed(String),

    #[error("Payment contract is not deployed yet. Set CONTRACT_ADDRESS to the deployed address.")]
    ContractNotConfigured,

    #[error("Insufficient funds in wallet")]
    InsufficientFunds,

    #[error("Transaction {0:#x} reverted")]
    TransactionReverted(TxHash),

    #[error("Cart is empty")]
    EmptyOrder,

    #[error("Wallet is not connected")]
    WalletNotConnected,

    #[error("Another request is already in progress")]
    AlreadyInProgress,

    #[error("Provider error: {0}")]
    UnknownProvider(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
