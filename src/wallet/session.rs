//! Wallet connection lifecycle.
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected(address, signer)
//!      ^                          |
//!      +-------- error ----------+
//! ```
//!
//! External account-change events can move the session back to
//! `Disconnected` (no account) or to a fresh `Connected` state at any time.

use ethers::types::Address;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ChainConfig;
use crate::types::{StoreError, StoreResult};
use crate::wallet::agent::{AgentError, Disposer, SignerHandle, SigningAgent};

enum SessionState {
    Disconnected,
    Connecting,
    Connected {
        address: Address,
        signer: SignerHandle,
    },
}

/// Connection state visible to callers, without the signer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    Connected,
}

pub struct WalletSession {
    agent: Arc<dyn SigningAgent>,
    chain: ChainConfig,
    state: Mutex<SessionState>,
    watch: Mutex<Option<Disposer>>,
}

impl WalletSession {
    pub fn new(agent: Arc<dyn SigningAgent>, chain: ChainConfig) -> Self {
        Self {
            agent,
            chain,
            state: Mutex::new(SessionState::Disconnected),
            watch: Mutex::new(None),
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        match *self.state.lock().await {
            SessionState::Disconnected => SessionPhase::Disconnected,
            SessionState::Connecting => SessionPhase::Connecting,
            SessionState::Connected { .. } => SessionPhase::Connected,
        }
    }

    pub async fn is_connecting(&self) -> bool {
        self.phase().await == SessionPhase::Connecting
    }

    pub async fn address(&self) -> Option<Address> {
        match *self.state.lock().await {
            SessionState::Connected { address, .. } => Some(address),
            _ => None,
        }
    }

    pub async fn signer(&self) -> Option<SignerHandle> {
        match &*self.state.lock().await {
            SessionState::Connected { signer, .. } => Some(signer.clone()),
            _ => None,
        }
    }

    /// Prompt the user for access, make sure the agent is on the required
    /// network (adding it to the agent's known list when missing) and
    /// capture a signer. A second call while one is still running fails
    /// with `AlreadyInProgress`.
    pub async fn connect(&self) -> StoreResult<Address> {
        {
            let mut state = self.state.lock().await;
            if matches!(*state, SessionState::Connecting) {
                return Err(StoreError::AlreadyInProgress);
            }
            *state = SessionState::Connecting;
        }

        match self.connect_inner().await {
            Ok((address, signer)) => {
                info!("Wallet connected: {address:?}");
                *self.state.lock().await = SessionState::Connected { address, signer };
                Ok(address)
            }
            Err(err) => {
                warn!("Wallet connection failed: {err}");
                *self.state.lock().await = SessionState::Disconnected;
                Err(err)
            }
        }
    }

    async fn connect_inner(&self) -> StoreResult<(Address, SignerHandle)> {
        let accounts = self
            .agent
            .request_accounts()
            .await
            .map_err(map_agent_err)?;
        let address = accounts
            .first()
            .copied()
            .ok_or(StoreError::UserRejected)?;

        self.ensure_chain().await?;

        let signer = self.agent.signer(address).await.map_err(map_agent_err)?;
        Ok((address, signer))
    }

    async fn ensure_chain(&self) -> StoreResult<()> {
        let current = self.agent.chain_id().await.map_err(map_agent_err)?;
        if current == self.chain.chain_id {
            return Ok(());
        }

        info!(
            "Switching network from chain {current} to {} ({})",
            self.chain.chain_id, self.chain.chain_name
        );
        match self.agent.switch_chain(self.chain.chain_id).await {
            Ok(()) => Ok(()),
            Err(AgentError::UnrecognizedChain(_)) => self
                .agent
                .add_chain(&self.chain.as_spec())
                .await
                .map_err(|err| StoreError::NetworkSwitchFailed(err.to_string())),
            Err(err) => Err(StoreError::NetworkSwitchFailed(err.to_string())),
        }
    }

    /// Prompt-free probe at startup: if an account is already authorized,
    /// establish `Connected` directly. Failures are logged and swallowed,
    /// the session just stays disconnected.
    pub async fn restore(&self) -> Option<Address> {
        let accounts = match self.agent.authorized_accounts().await {
            Ok(accounts) => accounts,
            Err(err) => {
                debug!("Wallet probe failed: {err}");
                return None;
            }
        };
        let address = accounts.first().copied()?;

        match self.agent.signer(address).await {
            Ok(signer) => {
                info!("Restored wallet session for {address:?}");
                *self.state.lock().await = SessionState::Connected { address, signer };
                Some(address)
            }
            Err(err) => {
                debug!("Could not restore signer for {address:?}: {err}");
                None
            }
        }
    }

    /// Resynchronize after an externally reported account change. A payment
    /// already in flight keeps the signer it captured at submission.
    pub async fn handle_accounts_changed(&self, account: Option<Address>) {
        match account {
            None => {
                info!("Wallet account cleared, disconnecting session");
                *self.state.lock().await = SessionState::Disconnected;
            }
            Some(address) => match self.agent.signer(address).await {
                Ok(signer) => {
                    info!("Wallet account changed to {address:?}");
                    *self.state.lock().await = SessionState::Connected { address, signer };
                }
                Err(err) => {
                    warn!("No signer for changed account {address:?}: {err}");
                    *self.state.lock().await = SessionState::Disconnected;
                }
            },
        }
    }

    /// Subscribe to the agent's account-change notifications and feed them
    /// into [`Self::handle_accounts_changed`]. The subscription is dropped
    /// by [`Self::close`] or when the session itself is dropped.
    pub async fn watch(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let disposer = self.agent.subscribe_accounts(Arc::new(move |account| {
            if let Some(session) = weak.upgrade() {
                tokio::spawn(async move {
                    session.handle_accounts_changed(account).await;
                });
            }
        }));
        if let Some(previous) = self.watch.lock().await.replace(disposer) {
            previous();
        }
    }

    /// Deterministic teardown: unsubscribe from the agent so no stale
    /// handler fires after the session is discarded.
    pub async fn close(&self) {
        if let Some(dispose) = self.watch.lock().await.take() {
            dispose();
        }
    }
}

impl Drop for WalletSession {
    fn drop(&mut self) {
        if let Some(dispose) = self.watch.get_mut().take() {
            dispose();
        }
    }
}

fn map_agent_err(err: AgentError) -> StoreError {
    match err {
        AgentError::Unavailable => StoreError::WalletUnavailable,
        AgentError::Rejected => StoreError::UserRejected,
        other => StoreError::UnknownProvider(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::simulated::SimulatedAgent;

    const SEPOLIA: u64 = 11_155_111;

    fn chain() -> ChainConfig {
        ChainConfig {
            chain_id: SEPOLIA,
            chain_name: "Sepolia".to_string(),
            currency_name: "Sepolia ETH".to_string(),
            currency_symbol: "ETH".to_string(),
            currency_decimals: 18,
            rpc_urls: vec!["https://rpc.sepolia.org".to_string()],
            block_explorer_urls: vec!["https://sepolia.etherscan.io".to_string()],
        }
    }

    fn buyer() -> Address {
        Address::from_low_u64_be(0xb0b)
    }

    #[tokio::test]
    async fn connect_switches_to_required_network() {
        let agent = Arc::new(SimulatedAgent::new(buyer()));
        agent.set_chain(1); // mainnet, Sepolia already known
        let session = WalletSession::new(agent.clone(), chain());

        let address = session.connect().await.unwrap();

        assert_eq!(address, buyer());
        assert_eq!(session.phase().await, SessionPhase::Connected);
        assert_eq!(agent.current_chain(), SEPOLIA);
    }

    #[tokio::test]
    async fn connect_adds_unknown_network_before_switching() {
        let agent = Arc::new(SimulatedAgent::new(buyer()));
        agent.set_chain(1);
        agent.forget_chain(SEPOLIA);
        let session = WalletSession::new(agent.clone(), chain());

        session.connect().await.unwrap();

        assert_eq!(agent.current_chain(), SEPOLIA);
    }

    #[tokio::test]
    async fn rejected_connect_returns_to_disconnected() {
        let agent = Arc::new(SimulatedAgent::new(buyer()));
        agent.set_rejecting(true);
        let session = WalletSession::new(agent, chain());

        let err = session.connect().await.unwrap_err();

        assert!(matches!(err, StoreError::UserRejected));
        assert_eq!(session.phase().await, SessionPhase::Disconnected);
    }

    #[tokio::test]
    async fn missing_agent_reports_wallet_unavailable() {
        let agent = Arc::new(SimulatedAgent::new(buyer()));
        agent.set_unavailable(true);
        let session = WalletSession::new(agent, chain());

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::WalletUnavailable));
    }

    #[tokio::test]
    async fn second_connect_while_connecting_fails() {
        let agent = Arc::new(SimulatedAgent::new(buyer()));
        let gate = agent.gate_prompts();
        let session = Arc::new(WalletSession::new(agent, chain()));

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.connect().await })
        };
        while !session.is_connecting().await {
            tokio::task::yield_now().await;
        }

        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInProgress));

        gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert_eq!(session.phase().await, SessionPhase::Connected);
    }

    #[tokio::test]
    async fn restore_connects_silently_when_preauthorized() {
        let agent = Arc::new(SimulatedAgent::pre_authorized(buyer()));
        let session = WalletSession::new(agent.clone(), chain());

        assert_eq!(session.restore().await, Some(buyer()));
        assert_eq!(session.phase().await, SessionPhase::Connected);
        assert_eq!(agent.prompt_count(), 0);
    }

    #[tokio::test]
    async fn restore_stays_disconnected_without_authorization() {
        let agent = Arc::new(SimulatedAgent::new(buyer()));
        let session = WalletSession::new(agent, chain());

        assert_eq!(session.restore().await, None);
        assert_eq!(session.phase().await, SessionPhase::Disconnected);
    }

    #[tokio::test]
    async fn account_change_resynchronizes_session() {
        let agent = Arc::new(SimulatedAgent::pre_authorized(buyer()));
        let session = WalletSession::new(agent, chain());
        session.restore().await;

        let other = Address::from_low_u64_be(0xa11ce);
        session.handle_accounts_changed(Some(other)).await;
        assert_eq!(session.address().await, Some(other));

        session.handle_accounts_changed(None).await;
        assert_eq!(session.phase().await, SessionPhase::Disconnected);
        assert!(session.signer().await.is_none());
    }

    #[tokio::test]
    async fn close_unsubscribes_from_agent_events() {
        let agent = Arc::new(SimulatedAgent::pre_authorized(buyer()));
        let session = Arc::new(WalletSession::new(agent.clone(), chain()));
        session.restore().await;
        session.watch().await;
        assert_eq!(agent.account_listener_count(), 1);

        session.close().await;
        assert_eq!(agent.account_listener_count(), 0);
    }
}
