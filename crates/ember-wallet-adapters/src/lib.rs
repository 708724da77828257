pub mod abi;
pub mod balance;
pub mod client;
pub mod config;
pub mod provider;
pub mod session;

pub use balance::{format_ether, RpcBalanceAdapter};
pub use client::{RpcWalletClient, WalletClientFactory};
pub use config::WalletAdapterConfig;
pub use provider::ProviderHandle;
pub use session::{EmbeddedSessionAdapter, EmbeddedWallet};
