use alloy::primitives::{address, Address, ChainId, U256};

use ember_wallet_core::MEGAETH_TESTNET;

/// Adapter configuration. Every field can be overridden from the
/// environment via [`WalletAdapterConfig::from_env`].
#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    /// EIP-1193-shaped JSON-RPC proxy for the embedded session. Leaving this
    /// unset keeps the adapters in deterministic mode.
    pub session_proxy_url: Option<String>,
    pub rpc_timeout_ms: u64,
    /// Account the deterministic session hands out on login.
    pub deterministic_address: Address,
    pub deterministic_chain_id: ChainId,
    pub deterministic_balance_wei: U256,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            session_proxy_url: None,
            rpc_timeout_ms: 15_000,
            deterministic_address: address!("1000000000000000000000000000000000000001"),
            deterministic_chain_id: MEGAETH_TESTNET,
            deterministic_balance_wei: U256::from(10u128.pow(18)),
        }
    }
}

impl WalletAdapterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("EMBER_SESSION_PROXY_URL") {
            if !url.is_empty() {
                config.session_proxy_url = Some(url);
            }
        }
        if let Some(timeout) = env_parse::<u64>("EMBER_RPC_TIMEOUT_MS") {
            config.rpc_timeout_ms = timeout;
        }
        if let Some(account) = env_parse::<Address>("EMBER_WALLET_ADDRESS") {
            config.deterministic_address = account;
        }
        if let Some(chain_id) = env_parse::<ChainId>("EMBER_DEFAULT_CHAIN_ID") {
            config.deterministic_chain_id = chain_id;
        }
        if let Some(balance) = env_parse::<U256>("EMBER_STARTING_BALANCE_WEI") {
            config.deterministic_balance_wei = balance;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}
