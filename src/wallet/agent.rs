//! Signing-agent boundary.
//!
//! Everything the storefront needs from a user-controlled wallet is behind
//! [`SigningAgent`]: account access, network selection, payment submission
//! and the contract's read-only queries. The core never assumes a concrete
//! transport; a browser-extension bridge, a JSON-RPC provider or the
//! in-process [`super::simulated::SimulatedAgent`] all fit the same trait.

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::sync::Arc;

use crate::models::PaymentReceipt;

/// Failures reported by the agent itself, before any storefront
/// interpretation. The wallet session and the payment gateway translate
/// these into user-facing [`crate::types::StoreError`] values.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AgentError {
    #[error("no signing agent is available")]
    Unavailable,

    #[error("the user rejected the request")]
    Rejected,

    #[error("chain {0} is not known to the agent")]
    UnrecognizedChain(u64),

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("{0}")]
    Other(String),
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Clone, serde::Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Network description handed to the agent when the required chain is not
/// in its known-network list. Chain id is the 0x-prefixed hex form agents
/// expect.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChainSpec {
    pub chain_id_hex: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

/// A payment transaction that has been submitted but not yet mined.
#[async_trait]
pub trait PendingPayment: Send + Sync {
    fn tx_hash(&self) -> TxHash;

    /// Wait until the transaction is mined and return its receipt. Not
    /// cancellable; dismissal paths surface before submission, not here.
    async fn confirm(self: Box<Self>) -> AgentResult<PaymentReceipt>;
}

/// Signing capability for one address, captured at connect time. A payment
/// in flight keeps using the handle it captured at submission even if the
/// active account changes underneath it.
#[async_trait]
pub trait PaymentSigner: Send + Sync {
    fn address(&self) -> Address;

    /// Submit the single payable contract call with `value` attached.
    async fn submit_payment(
        &self,
        contract: Address,
        value: U256,
    ) -> AgentResult<Box<dyn PendingPayment>>;
}

pub type SignerHandle = Arc<dyn PaymentSigner>;

pub type AccountListener = Arc<dyn Fn(Option<Address>) + Send + Sync>;
pub type ChainListener = Arc<dyn Fn(u64) + Send + Sync>;

/// Removes a previously registered listener. Calling it more than once is
/// harmless.
pub type Disposer = Box<dyn FnOnce() + Send>;

#[async_trait]
pub trait SigningAgent: Send + Sync {
    /// Accounts already authorized for this origin, without prompting.
    async fn authorized_accounts(&self) -> AgentResult<Vec<Address>>;

    /// Prompt the user for account access.
    async fn request_accounts(&self) -> AgentResult<Vec<Address>>;

    async fn chain_id(&self) -> AgentResult<u64>;

    async fn switch_chain(&self, chain_id: u64) -> AgentResult<()>;

    async fn add_chain(&self, spec: &ChainSpec) -> AgentResult<()>;

    async fn signer(&self, address: Address) -> AgentResult<SignerHandle>;

    /// Read-only query: the contract's beneficiary address.
    async fn contract_owner(&self, contract: Address) -> AgentResult<Address>;

    /// Read-only query: how many payments the contract has received.
    async fn total_payments(&self, contract: Address) -> AgentResult<u64>;

    fn subscribe_accounts(&self, listener: AccountListener) -> Disposer;

    fn subscribe_chain(&self, listener: ChainListener) -> Disposer;
}
