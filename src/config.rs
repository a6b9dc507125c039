use anyhow::{Context, Result};
use ethers::types::{Address, U256};
use ethers::utils::parse_ether;
use serde::Deserialize;
use std::env;

use crate::wallet::agent::{ChainSpec, NativeCurrency};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub chain: ChainConfig,
    pub contract: ContractConfig,
}

/// The test network checkout runs against. Defaults describe Sepolia.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl ChainConfig {
    /// Network description in the shape wallet agents expect when asked to
    /// add an unknown chain (hex chain id).
    pub fn as_spec(&self) -> ChainSpec {
        ChainSpec {
            chain_id_hex: format!("{:#x}", self.chain_id),
            chain_name: self.chain_name.clone(),
            native_currency: NativeCurrency {
                name: self.currency_name.clone(),
                symbol: self.currency_symbol.clone(),
                decimals: self.currency_decimals,
            },
            rpc_urls: self.rpc_urls.clone(),
            block_explorer_urls: self.block_explorer_urls.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    /// Deployed payment contract. The zero address means "not deployed yet"
    /// and makes every payment fail until it is replaced.
    pub address: Address,
    /// Price of one catalog item in network currency, as the exact decimal
    /// string the deployer published.
    pub unit_amount: String,
    /// Same amount in wei, parsed once at startup.
    pub unit_amount_wei: U256,
    /// Address that receives the payments.
    pub owner: Address,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let unit_amount =
            env::var("PAYMENT_AMOUNT").unwrap_or_else(|_| "0.000001".to_string());
        let unit_amount_wei = parse_ether(unit_amount.as_str())
            .with_context(|| format!("invalid PAYMENT_AMOUNT: {unit_amount}"))?;

        Ok(Self {
            chain: ChainConfig {
                chain_id: env::var("CHAIN_ID")
                    .unwrap_or_else(|_| "11155111".to_string())
                    .parse()?,
                chain_name: env::var("CHAIN_NAME").unwrap_or_else(|_| "Sepolia".to_string()),
                currency_name: env::var("CURRENCY_NAME")
                    .unwrap_or_else(|_| "Sepolia ETH".to_string()),
                currency_symbol: env::var("CURRENCY_SYMBOL")
                    .unwrap_or_else(|_| "ETH".to_string()),
                currency_decimals: env::var("CURRENCY_DECIMALS")
                    .unwrap_or_else(|_| "18".to_string())
                    .parse()?,
                rpc_urls: env::var("RPC_URLS")
                    .unwrap_or_else(|_| "https://rpc.sepolia.org".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
                block_explorer_urls: env::var("BLOCK_EXPLORER_URLS")
                    .unwrap_or_else(|_| "https://sepolia.etherscan.io".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            contract: ContractConfig {
                address: env::var("CONTRACT_ADDRESS")
                    .unwrap_or_else(|_| {
                        "0xb7b43c3E5926eF2329f95Dcc8dd5dCFe103007e4".to_string()
                    })
                    .parse()
                    .context("invalid CONTRACT_ADDRESS")?,
                unit_amount,
                unit_amount_wei,
                owner: env::var("OWNER_ADDRESS")
                    .unwrap_or_else(|_| {
                        "0x1BeB7894f17024A1D5f3D5aa079aCAE180e0fc4E".to_string()
                    })
                    .parse()
                    .context("invalid OWNER_ADDRESS")?,
            },
        })
    }
}
