//! Embedded-wallet session adapter.
//!
//! Two runtime modes, decided by configuration: a deterministic in-memory
//! session for running without any provider, and a proxy mode speaking
//! EIP-1193-shaped JSON-RPC to a configured endpoint. An embedded wallet is
//! created for every user on login.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use alloy::primitives::{keccak256, Address, ChainId, B256, U256};
use serde_json::{json, Value};
use tracing::info;

use ember_wallet_core::{PortError, SessionPort, WalletPort};

use crate::provider::{json_chain_id_to_u64, parse_tx_hash, ProviderHandle};
use crate::WalletAdapterConfig;

#[derive(Debug, Clone)]
enum SessionMode {
    Deterministic,
    Proxy(ProviderHandle),
}

#[derive(Debug, Clone, Copy)]
struct EmbeddedAccount {
    address: Address,
    chain_id: ChainId,
}

#[derive(Debug, Default)]
struct SessionState {
    authenticated: bool,
    wallet: Option<EmbeddedAccount>,
}

struct SessionShared {
    mode: SessionMode,
    config: WalletAdapterConfig,
    state: Mutex<SessionState>,
}

#[derive(Clone)]
pub struct EmbeddedSessionAdapter {
    shared: Arc<SessionShared>,
}

impl EmbeddedSessionAdapter {
    pub fn new(config: WalletAdapterConfig) -> Result<Self, PortError> {
        let mode = match &config.session_proxy_url {
            Some(base_url) => {
                let client = reqwest::Client::builder()
                    .timeout(Duration::from_millis(config.rpc_timeout_ms))
                    .build()
                    .map_err(|e| {
                        PortError::Transport(format!("failed to build session http client: {e}"))
                    })?;
                SessionMode::Proxy(ProviderHandle::Http {
                    base_url: base_url.clone(),
                    client,
                })
            }
            None => SessionMode::Deterministic,
        };
        Ok(Self {
            shared: Arc::new(SessionShared {
                mode,
                config,
                state: Mutex::new(SessionState::default()),
            }),
        })
    }

    pub fn from_env() -> Result<Self, PortError> {
        Self::new(WalletAdapterConfig::from_env())
    }
}

impl SessionPort for EmbeddedSessionAdapter {
    type Wallet = EmbeddedWallet;

    fn authenticated(&self) -> bool {
        lock_state(&self.shared).authenticated
    }

    async fn login(&self) -> Result<(), PortError> {
        match &self.shared.mode {
            SessionMode::Deterministic => {
                let mut state = lock_state(&self.shared);
                state.authenticated = true;
                if state.wallet.is_none() {
                    state.wallet = Some(EmbeddedAccount {
                        address: self.shared.config.deterministic_address,
                        chain_id: self.shared.config.deterministic_chain_id,
                    });
                }
                info!("session authenticated in deterministic mode");
                Ok(())
            }
            SessionMode::Proxy(handle) => {
                let accounts = handle.request("eth_requestAccounts", json!([])).await?;
                let first = accounts
                    .as_array()
                    .and_then(|arr| arr.first())
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        PortError::Transport("eth_requestAccounts returned no accounts".to_owned())
                    })?;
                let address: Address = first
                    .parse()
                    .map_err(|e| PortError::Validation(format!("invalid account address: {e}")))?;
                let chain = handle.request("eth_chainId", json!([])).await?;
                let chain_id = json_chain_id_to_u64(&chain)?;

                let mut state = lock_state(&self.shared);
                state.authenticated = true;
                state.wallet = Some(EmbeddedAccount { address, chain_id });
                info!(%address, chain_id, "session authenticated");
                Ok(())
            }
        }
    }

    async fn logout(&self) -> Result<(), PortError> {
        let mut state = lock_state(&self.shared);
        state.authenticated = false;
        state.wallet = None;
        info!("session logged out");
        Ok(())
    }

    fn wallets(&self) -> Vec<EmbeddedWallet> {
        self.embedded_wallet().into_iter().collect()
    }

    fn embedded_wallet(&self) -> Option<EmbeddedWallet> {
        let state = lock_state(&self.shared);
        if !state.authenticated {
            return None;
        }
        state.wallet.map(|account| EmbeddedWallet {
            address: account.address,
            shared: Arc::clone(&self.shared),
        })
    }

    async fn send_value_transfer(&self, to: Address, value: U256) -> Result<B256, PortError> {
        let from = lock_state(&self.shared)
            .wallet
            .map(|account| account.address)
            .ok_or_else(|| PortError::Unavailable("no embedded wallet connected".to_owned()))?;
        let payload = json!({
            "from": from,
            "to": to,
            "value": format!("0x{value:x}"),
        });
        match &self.shared.mode {
            SessionMode::Deterministic => deterministic_hash(&payload),
            SessionMode::Proxy(handle) => {
                let result = handle.request("eth_sendTransaction", json!([payload])).await?;
                parse_tx_hash(&result)
            }
        }
    }
}

/// Handle to the session's embedded wallet. Mutation goes through the
/// handle's own operations; holders never touch session state directly.
#[derive(Clone)]
pub struct EmbeddedWallet {
    address: Address,
    shared: Arc<SessionShared>,
}

impl WalletPort for EmbeddedWallet {
    type Provider = ProviderHandle;

    fn address(&self) -> Address {
        self.address
    }

    fn chain_identifier(&self) -> Option<String> {
        lock_state(&self.shared)
            .wallet
            .map(|account| format!("eip155:{}", account.chain_id))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), PortError> {
        if lock_state(&self.shared).wallet.is_none() {
            return Err(PortError::Unavailable("no embedded wallet to switch".to_owned()));
        }
        if let SessionMode::Proxy(handle) = &self.shared.mode {
            handle
                .request(
                    "wallet_switchEthereumChain",
                    json!([{ "chainId": format!("0x{chain_id:x}") }]),
                )
                .await?;
        }
        let mut state = lock_state(&self.shared);
        match state.wallet.as_mut() {
            Some(account) => {
                account.chain_id = chain_id;
                info!(chain_id, "wallet switched chain");
                Ok(())
            }
            None => Err(PortError::Unavailable("wallet disconnected during switch".to_owned())),
        }
    }

    async fn network_provider(&self) -> Result<ProviderHandle, PortError> {
        if lock_state(&self.shared).wallet.is_none() {
            return Err(PortError::Unavailable("no embedded wallet connected".to_owned()));
        }
        match &self.shared.mode {
            SessionMode::Deterministic => Ok(ProviderHandle::Deterministic),
            SessionMode::Proxy(handle) => Ok(handle.clone()),
        }
    }
}

/// Deterministic fallback: the canonical payload hashes to a stable pseudo
/// transaction hash.
pub(crate) fn deterministic_hash(payload: &Value) -> Result<B256, PortError> {
    let canonical = serde_json::to_vec(payload)
        .map_err(|e| PortError::Validation(format!("tx payload serialization failed: {e}")))?;
    Ok(keccak256(canonical))
}

fn lock_state(shared: &SessionShared) -> MutexGuard<'_, SessionState> {
    shared.state.lock().unwrap_or_else(PoisonError::into_inner)
}
