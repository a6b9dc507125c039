//! Payment submission and confirmation.
//!
//! One payable call carries the whole order: `unit amount x item count`,
//! computed in wei as `U256` so the amount matches the contract's
//! expectations exactly. No floating point anywhere on this path.

use ethers::types::{Address, TxHash, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

use crate::config::ContractConfig;
use crate::models::{ContractInfo, PaymentReceipt};
use crate::types::{StoreError, StoreResult};
use crate::wallet::agent::{AgentError, SignerHandle, SigningAgent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttemptPhase {
    #[default]
    Idle,
    Submitting,
    Confirmed,
    Failed,
}

/// Snapshot of the current or most recent payment attempt, for display
/// while a payment is in flight and after it settles.
#[derive(Debug, Clone, Default)]
pub struct PaymentAttempt {
    pub item_count: usize,
    pub total_wei: U256,
    pub phase: AttemptPhase,
    pub tx_hash: Option<TxHash>,
    pub error: Option<String>,
}

pub struct PaymentGateway {
    contract: ContractConfig,
    in_flight: AtomicBool,
    attempt: Mutex<PaymentAttempt>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PaymentGateway {
    pub fn new(contract: ContractConfig) -> Self {
        Self {
            contract,
            in_flight: AtomicBool::new(false),
            attempt: Mutex::new(PaymentAttempt::default()),
        }
    }

    /// Exact total for `item_count` items in wei.
    pub fn total_for(&self, item_count: usize) -> U256 {
        self.contract.unit_amount_wei * U256::from(item_count)
    }

    /// Snapshot of the current attempt state.
    pub fn attempt(&self) -> PaymentAttempt {
        self.attempt
            .lock()
            .expect("payment attempt lock poisoned")
            .clone()
    }

    fn update_attempt(&self, update: impl FnOnce(&mut PaymentAttempt)) {
        let mut attempt = self.attempt.lock().expect("payment attempt lock poisoned");
        update(&mut attempt);
    }

    /// Submit one payment for `item_count` items and wait for it to be
    /// mined. Nothing is retried here; on any failure the caller may
    /// simply invoke `pay` again.
    pub async fn pay(
        &self,
        signer: &SignerHandle,
        item_count: usize,
    ) -> StoreResult<PaymentReceipt> {
        if item_count == 0 {
            return Err(StoreError::EmptyOrder);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(StoreError::AlreadyInProgress);
        }
        let _reset = InFlight(&self.in_flight);

        let result = self.pay_inner(signer, item_count).await;
        match &result {
            Ok(receipt) => {
                info!("Transaction confirmed in block {}", receipt.block_number);
                self.update_attempt(|attempt| attempt.phase = AttemptPhase::Confirmed);
            }
            Err(err) => {
                warn!("Payment failed: {err}");
                let message = err.to_string();
                self.update_attempt(|attempt| {
                    attempt.phase = AttemptPhase::Failed;
                    attempt.error = Some(message);
                });
            }
        }
        result
    }

    async fn pay_inner(
        &self,
        signer: &SignerHandle,
        item_count: usize,
    ) -> StoreResult<PaymentReceipt> {
        if self.contract.address.is_zero() {
            return Err(StoreError::ContractNotConfigured);
        }

        let total = self.total_for(item_count);
        self.update_attempt(|attempt| {
            *attempt = PaymentAttempt {
                item_count,
                total_wei: total,
                phase: AttemptPhase::Submitting,
                tx_hash: None,
                error: None,
            };
        });
        info!(
            "Paying {} wei ({} x {}) to {:?}",
            total, self.contract.unit_amount, item_count, self.contract.address
        );

        let pending = signer
            .submit_payment(self.contract.address, total)
            .await
            .map_err(map_payment_err)?;
        let tx_hash = pending.tx_hash();
        self.update_attempt(|attempt| attempt.tx_hash = Some(tx_hash));
        info!("Transaction sent: {tx_hash:#x}, waiting for confirmation");

        let receipt = pending.confirm().await.map_err(map_payment_err)?;
        if !receipt.succeeded {
            return Err(StoreError::TransactionReverted(tx_hash));
        }
        Ok(receipt)
    }

    /// Owner and payment counter for display. With the placeholder zero
    /// address the configured owner and a zero counter are reported
    /// instead of erroring, so the storefront still renders.
    pub async fn contract_info(&self, agent: &dyn SigningAgent) -> StoreResult<ContractInfo> {
        if self.contract.address.is_zero() {
            return Ok(ContractInfo {
                owner: self.contract.owner,
                total_payments: 0,
            });
        }

        let owner = agent
            .contract_owner(self.contract.address)
            .await
            .map_err(map_payment_err)?;
        let total_payments = agent
            .total_payments(self.contract.address)
            .await
            .map_err(map_payment_err)?;
        Ok(ContractInfo {
            owner,
            total_payments,
        })
    }
}

fn map_payment_err(err: AgentError) -> StoreError {
    match err {
        AgentError::Rejected => StoreError::UserRejected,
        AgentError::InsufficientFunds => StoreError::InsufficientFunds,
        AgentError::Unavailable => StoreError::WalletUnavailable,
        other => StoreError::UnknownProvider(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::simulated::SimulatedAgent;
    use ethers::utils::parse_ether;
    use std::sync::Arc;

    fn contract(address: Address) -> ContractConfig {
        ContractConfig {
            address,
            unit_amount: "0.000001".to_string(),
            unit_amount_wei: parse_ether("0.000001").unwrap(),
            owner: Address::from_low_u64_be(0xfeed),
        }
    }

    fn deployed() -> ContractConfig {
        contract(Address::from_low_u64_be(0xc0ffee))
    }

    async fn signer_for(agent: &SimulatedAgent) -> SignerHandle {
        let buyer = Address::from_low_u64_be(0xb0b);
        agent.signer(buyer).await.unwrap()
    }

    #[test]
    fn total_is_exact_integer_wei_arithmetic() {
        let gateway = PaymentGateway::new(deployed());
        // 0.000001 ETH = 10^12 wei, three items = 3 * 10^12 exactly
        assert_eq!(gateway.total_for(3), U256::from(3_000_000_000_000u64));
        assert_eq!(gateway.total_for(1), U256::from(1_000_000_000_000u64));
    }

    #[tokio::test]
    async fn zero_items_is_an_empty_order() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        let gateway = PaymentGateway::new(deployed());
        let signer = signer_for(&agent).await;

        let err = gateway.pay(&signer, 0).await.unwrap_err();
        assert!(matches!(err, StoreError::EmptyOrder));
        assert_eq!(gateway.attempt().phase, AttemptPhase::Idle);
    }

    #[tokio::test]
    async fn placeholder_address_is_not_configured() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        let gateway = PaymentGateway::new(contract(Address::zero()));
        let signer = signer_for(&agent).await;

        let err = gateway.pay(&signer, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::ContractNotConfigured));
    }

    #[tokio::test]
    async fn confirmed_payment_reports_block_and_hash() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        let gateway = PaymentGateway::new(deployed());
        let signer = signer_for(&agent).await;

        let receipt = gateway.pay(&signer, 2).await.unwrap();

        assert!(receipt.succeeded);
        assert_eq!(receipt.tx_hash, TxHash::from_low_u64_be(1));
        let submitted = agent.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].value, U256::from(2_000_000_000_000u64));
        assert_eq!(gateway.attempt().phase, AttemptPhase::Confirmed);
    }

    #[tokio::test]
    async fn rejected_signing_surfaces_and_stays_retryable() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        agent.set_reject_payments(true);
        let gateway = PaymentGateway::new(deployed());
        let signer = signer_for(&agent).await;

        let err = gateway.pay(&signer, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::UserRejected));
        assert_eq!(gateway.attempt().phase, AttemptPhase::Failed);
        assert!(agent.submitted().is_empty());

        agent.set_reject_payments(false);
        gateway.pay(&signer, 1).await.unwrap();
    }

    #[tokio::test]
    async fn short_balance_reports_insufficient_funds() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        agent.set_balance(U256::from(10));
        let gateway = PaymentGateway::new(deployed());
        let signer = signer_for(&agent).await;

        let err = gateway.pay(&signer, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::InsufficientFunds));
    }

    #[tokio::test]
    async fn reverted_transaction_is_reported_with_its_hash() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        agent.set_revert_payments(true);
        let gateway = PaymentGateway::new(deployed());
        let signer = signer_for(&agent).await;

        let err = gateway.pay(&signer, 1).await.unwrap_err();
        match err {
            StoreError::TransactionReverted(hash) => {
                assert_eq!(hash, TxHash::from_low_u64_be(1));
            }
            other => panic!("expected revert, got {other}"),
        }
    }

    #[tokio::test]
    async fn overlapping_pay_calls_fail_instead_of_double_submitting() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        let gate = agent.gate_submissions();
        let gateway = Arc::new(PaymentGateway::new(deployed()));
        let signer = signer_for(&agent).await;

        let first = {
            let gateway = gateway.clone();
            let signer = signer.clone();
            tokio::spawn(async move { gateway.pay(&signer, 1).await })
        };
        while gateway.attempt().phase != AttemptPhase::Submitting {
            tokio::task::yield_now().await;
        }

        let err = gateway.pay(&signer, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInProgress));

        gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert_eq!(agent.submitted().len(), 1);
    }

    #[tokio::test]
    async fn contract_info_falls_back_for_placeholder_address() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        let config = contract(Address::zero());
        let owner = config.owner;
        let gateway = PaymentGateway::new(config);

        let info = gateway.contract_info(&agent).await.unwrap();
        assert_eq!(info.owner, owner);
        assert_eq!(info.total_payments, 0);
    }

    #[tokio::test]
    async fn contract_info_reads_through_the_agent() {
        let agent = SimulatedAgent::new(Address::from_low_u64_be(0xb0b));
        agent.set_contract_owner(Address::from_low_u64_be(0xcafe));
        let gateway = PaymentGateway::new(deployed());
        let signer = agent.signer(Address::from_low_u64_be(0xb0b)).await.unwrap();
        gateway.pay(&signer, 1).await.unwrap();

        let info = gateway.contract_info(&agent).await.unwrap();
        assert_eq!(info.owner, Address::from_low_u64_be(0xcafe));
        assert_eq!(info.total_payments, 1);
    }
}
