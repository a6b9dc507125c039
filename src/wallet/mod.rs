// Wallet connection and the signing-agent boundary

pub mod agent;
pub mod session;
pub mod simulated;

pub use agent::{AgentError, SignerHandle, SigningAgent};
pub use session::{SessionPhase, WalletSession};
pub use simulated::SimulatedAgent;
