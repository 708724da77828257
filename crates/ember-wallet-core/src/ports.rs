use alloy::primitives::{Address, ChainId, B256, U256};
use thiserror::Error;

use crate::chains::ChainEntry;
use crate::domain::{BalanceSnapshot, ClientKey, ContractCall};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("capability unavailable: {0}")]
    Unavailable(String),
}

/// Authentication state and connected wallets, as exposed by the embedded
/// wallet provider. Also carries the provider's session-level transaction
/// submission capability.
pub trait SessionPort {
    type Wallet: WalletPort;

    fn authenticated(&self) -> bool;
    async fn login(&self) -> Result<(), PortError>;
    async fn logout(&self) -> Result<(), PortError>;
    fn wallets(&self) -> Vec<Self::Wallet>;
    fn embedded_wallet(&self) -> Option<Self::Wallet>;
    async fn send_value_transfer(&self, to: Address, value: U256) -> Result<B256, PortError>;
}

/// A wallet handle owned by the session provider. All mutation (chain switch,
/// signing) is requested through the handle's own operations; this system
/// never mutates a handle directly.
pub trait WalletPort {
    type Provider;

    fn address(&self) -> Address;
    /// Composite chain identifier, e.g. `"eip155:6342"`.
    fn chain_identifier(&self) -> Option<String>;
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), PortError>;
    async fn network_provider(&self) -> Result<Self::Provider, PortError>;
}

/// Builds a wallet client bound to one (account, chain) pair from a network
/// provider handle obtained off the wallet.
pub trait ClientFactoryPort {
    type Provider;
    type Client: ClientPort;

    async fn build_client(
        &self,
        account: Address,
        chain: &'static ChainEntry,
        provider: Self::Provider,
    ) -> Result<Self::Client, PortError>;
}

pub trait ClientPort {
    /// The pair this client was built for.
    fn key(&self) -> ClientKey;
    async fn write_contract(&self, call: &ContractCall) -> Result<B256, PortError>;
}

pub trait BalancePort {
    async fn fetch_balance(
        &self,
        address: Address,
        chain_id: ChainId,
    ) -> Result<BalanceSnapshot, PortError>;
}
