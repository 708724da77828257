// Futures from these traits are driven on a single cooperative runtime; no
// Send bound is imposed at the trait level.
#![allow(async_fn_in_trait)]

pub mod balance;
pub mod chains;
pub mod domain;
pub mod lifecycle;
pub mod ports;
pub mod submit;

pub use balance::BalanceObserver;
pub use chains::{
    chain_entry, resolve_chain_id, ChainEntry, MEGAETH_TESTNET, RISE_TESTNET, SETTER_ABI_JSON,
    SETTER_FUNCTION, SUPPORTED_CHAINS,
};
pub use domain::{
    BalanceGate, BalanceSnapshot, ClientKey, ClientState, ContractCall, SubmissionKind,
    SubmissionState,
};
pub use lifecycle::ClientManager;
pub use ports::{
    BalancePort, ClientFactoryPort, ClientPort, PortError, SessionPort, WalletPort,
};
pub use submit::{SubmissionController, SubmitError, SETTER_TEST_VALUE};
