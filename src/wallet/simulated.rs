//! Deterministic in-process signing agent.
//!
//! Stands in for a browser wallet in the demo binary and the test suite:
//! account prompts, network switching, balances and payment submission are
//! all scriptable, transaction hashes are a plain counter, and
//! account/chain events fan out to real subscribers.

use async_trait::async_trait;
use ethers::types::{Address, TxHash, U256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;

use crate::models::PaymentReceipt;
use crate::wallet::agent::{
    AccountListener, AgentError, AgentResult, ChainListener, ChainSpec, Disposer, PaymentSigner,
    PendingPayment, SignerHandle, SigningAgent,
};

const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
const MAINNET_CHAIN_ID: u64 = 1;
const BLOCK_BASE: u64 = 4_200_000;

/// One wei-carrying call recorded by the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedPayment {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub tx_hash: TxHash,
}

struct SimState {
    // wallet surface
    grantable: Address,
    authorized: Vec<Address>,
    rejecting: bool,
    unavailable: bool,
    prompt_count: u32,
    prompt_gate: Option<Arc<Semaphore>>,

    // network surface
    current_chain: u64,
    known_chains: HashSet<u64>,

    // payment surface
    balance: U256,
    reject_payments: bool,
    revert_payments: bool,
    submit_gate: Option<Arc<Semaphore>>,
    submitted: Vec<SubmittedPayment>,
    tx_counter: u64,
    contract_owner: Address,

    // event surface
    account_listeners: HashMap<u64, AccountListener>,
    chain_listeners: HashMap<u64, ChainListener>,
}

pub struct SimulatedAgent {
    state: Arc<Mutex<SimState>>,
    next_listener_id: AtomicU64,
}

impl SimulatedAgent {
    /// Agent holding one grantable account that has not authorized the
    /// storefront yet. Starts on Sepolia with a 1 ETH balance.
    pub fn new(account: Address) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                grantable: account,
                authorized: Vec::new(),
                rejecting: false,
                unavailable: false,
                prompt_count: 0,
                prompt_gate: None,
                current_chain: SEPOLIA_CHAIN_ID,
                known_chains: HashSet::from([MAINNET_CHAIN_ID, SEPOLIA_CHAIN_ID]),
                balance: U256::exp10(18),
                reject_payments: false,
                revert_payments: false,
                submit_gate: None,
                submitted: Vec::new(),
                tx_counter: 0,
                contract_owner: Address::zero(),
                account_listeners: HashMap::new(),
                chain_listeners: HashMap::new(),
            })),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// Agent whose account already authorized the storefront, so a silent
    /// probe finds it without prompting.
    pub fn pre_authorized(account: Address) -> Self {
        let agent = Self::new(account);
        agent.lock().authorized = vec![account];
        agent
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().expect("simulated agent state poisoned")
    }

    pub fn set_chain(&self, chain_id: u64) {
        let mut state = self.lock();
        state.current_chain = chain_id;
        state.known_chains.insert(chain_id);
    }

    pub fn forget_chain(&self, chain_id: u64) {
        self.lock().known_chains.remove(&chain_id);
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.lock().rejecting = rejecting;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn set_balance(&self, balance: U256) {
        self.lock().balance = balance;
    }

    pub fn set_reject_payments(&self, reject: bool) {
        self.lock().reject_payments = reject;
    }

    pub fn set_revert_payments(&self, revert: bool) {
        self.lock().revert_payments = revert;
    }

    pub fn set_contract_owner(&self, owner: Address) {
        self.lock().contract_owner = owner;
    }

    /// Hold account prompts until a permit is added to the returned gate.
    pub fn gate_prompts(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().prompt_gate = Some(gate.clone());
        gate
    }

    /// Hold payment submissions until a permit is added to the returned
    /// gate.
    pub fn gate_submissions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.lock().submit_gate = Some(gate.clone());
        gate
    }

    /// Externally change the active account and notify subscribers, the
    /// way a user switching accounts in the wallet popup would.
    pub fn change_account(&self, account: Option<Address>) {
        let listeners: Vec<AccountListener> = {
            let mut state = self.lock();
            state.authorized = account.into_iter().collect();
            state.account_listeners.values().cloned().collect()
        };
        for listener in listeners {
            listener(account);
        }
    }

    /// Externally change the active chain and notify subscribers.
    pub fn change_chain(&self, chain_id: u64) {
        let listeners: Vec<ChainListener> = {
            let mut state = self.lock();
            state.current_chain = chain_id;
            state.known_chains.insert(chain_id);
            state.chain_listeners.values().cloned().collect()
        };
        for listener in listeners {
            listener(chain_id);
        }
    }

    pub fn current_chain(&self) -> u64 {
        self.lock().current_chain
    }

    pub fn balance(&self) -> U256 {
        self.lock().balance
    }

    pub fn prompt_count(&self) -> u32 {
        self.lock().prompt_count
    }

    pub fn account_listener_count(&self) -> usize {
        self.lock().account_listeners.len()
    }

    pub fn submitted(&self) -> Vec<SubmittedPayment> {
        self.lock().submitted.clone()
    }
}

struct SimulatedSigner {
    address: Address,
    state: Arc<Mutex<SimState>>,
}

struct SimulatedPending {
    tx_hash: TxHash,
    receipt: PaymentReceipt,
}

#[async_trait]
impl PendingPayment for SimulatedPending {
    fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    async fn confirm(self: Box<Self>) -> AgentResult<PaymentReceipt> {
        // Yield once so confirmation is a real suspension point.
        tokio::task::yield_now().await;
        Ok(self.receipt)
    }
}

#[async_trait]
impl PaymentSigner for SimulatedSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn submit_payment(
        &self,
        contract: Address,
        value: U256,
    ) -> AgentResult<Box<dyn PendingPayment>> {
        let gate = {
            self.state
                .lock()
                .expect("simulated agent state poisoned")
                .submit_gate
                .clone()
        };
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|err| AgentError::Other(err.to_string()))?
                .forget();
        }

        let mut state = self.state.lock().expect("simulated agent state poisoned");
        if state.reject_payments {
            return Err(AgentError::Rejected);
        }
        if state.balance < value {
            return Err(AgentError::InsufficientFunds);
        }

        state.balance -= value;
        state.tx_counter += 1;
        let tx_hash = TxHash::from_low_u64_be(state.tx_counter);
        state.submitted.push(SubmittedPayment {
            from: self.address,
            to: contract,
            value,
            tx_hash,
        });

        Ok(Box::new(SimulatedPending {
            tx_hash,
            receipt: PaymentReceipt {
                tx_hash,
                block_number: BLOCK_BASE + state.tx_counter,
                succeeded: !state.revert_payments,
            },
        }))
    }
}

#[async_trait]
impl SigningAgent for SimulatedAgent {
    async fn authorized_accounts(&self) -> AgentResult<Vec<Address>> {
        let state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        Ok(state.authorized.clone())
    }

    async fn request_accounts(&self) -> AgentResult<Vec<Address>> {
        let gate = self.lock().prompt_gate.clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|err| AgentError::Other(err.to_string()))?
                .forget();
        }

        let mut state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        state.prompt_count += 1;
        if state.rejecting {
            return Err(AgentError::Rejected);
        }
        let account = state.grantable;
        state.authorized = vec![account];
        Ok(vec![account])
    }

    async fn chain_id(&self) -> AgentResult<u64> {
        let state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        Ok(state.current_chain)
    }

    async fn switch_chain(&self, chain_id: u64) -> AgentResult<()> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        if !state.known_chains.contains(&chain_id) {
            return Err(AgentError::UnrecognizedChain(chain_id));
        }
        state.current_chain = chain_id;
        Ok(())
    }

    async fn add_chain(&self, spec: &ChainSpec) -> AgentResult<()> {
        let chain_id = spec
            .chain_id_hex
            .strip_prefix("0x")
            .and_then(|hex| u64::from_str_radix(hex, 16).ok())
            .ok_or_else(|| AgentError::Other(format!("bad chain id {}", spec.chain_id_hex)))?;

        let mut state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        state.known_chains.insert(chain_id);
        // Adding a chain also makes it active, matching wallet behavior.
        state.current_chain = chain_id;
        Ok(())
    }

    async fn signer(&self, address: Address) -> AgentResult<SignerHandle> {
        let state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        Ok(Arc::new(SimulatedSigner {
            address,
            state: self.state.clone(),
        }))
    }

    async fn contract_owner(&self, _contract: Address) -> AgentResult<Address> {
        let state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        Ok(state.contract_owner)
    }

    async fn total_payments(&self, _contract: Address) -> AgentResult<u64> {
        let state = self.lock();
        if state.unavailable {
            return Err(AgentError::Unavailable);
        }
        Ok(state.submitted.len() as u64)
    }

    fn subscribe_accounts(&self, listener: AccountListener) -> Disposer {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.lock().account_listeners.insert(id, listener);
        let state = self.state.clone();
        Box::new(move || {
            if let Ok(mut state) = state.lock() {
                state.account_listeners.remove(&id);
            }
        })
    }

    fn subscribe_chain(&self, listener: ChainListener) -> Disposer {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.lock().chain_listeners.insert(id, listener);
        let state = self.state.clone();
        Box::new(move || {
            if let Ok(mut state) = state.lock() {
                state.chain_listeners.remove(&id);
            }
        })
    }
}
