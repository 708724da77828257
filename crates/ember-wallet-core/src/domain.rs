use std::fmt;

use alloy::primitives::{Address, ChainId, B256, U256};
use serde::{Deserialize, Serialize};

/// The (account, chain) pair a wallet client is built for. A client is valid
/// only for the exact key it was constructed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientKey {
    pub address: Address,
    pub chain_id: ChainId,
}

/// Lifecycle state of the managed wallet client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Absent,
    Constructing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionKind {
    Transfer,
    ContractWrite,
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionKind::Transfer => f.write_str("transfer"),
            SubmissionKind::ContractWrite => f.write_str("contract write"),
        }
    }
}

/// Per-operation submission state. The `busy` flag serializes an operation
/// against itself; the two operation kinds never share one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionState {
    pub busy: bool,
    pub last_result_id: Option<B256>,
}

/// A contract write request, fully resolved against the chain registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub account: Address,
    pub contract: Address,
    pub abi_json: String,
    pub function: String,
    pub args: Vec<String>,
    pub chain_id: ChainId,
}

/// Native balance for one (address, chain) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub value: U256,
    pub formatted: String,
    pub symbol: String,
}

/// Gating decision derived from the current balance snapshot. An absent
/// snapshot reads as `Loading`, which disables controls like a zero balance
/// does but stays visually distinguishable from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceGate {
    Loading,
    Insufficient,
    Funded,
}

impl BalanceGate {
    pub fn from_snapshot(snapshot: Option<&BalanceSnapshot>) -> Self {
        match snapshot {
            None => BalanceGate::Loading,
            Some(s) if s.value > U256::ZERO => BalanceGate::Funded,
            Some(_) => BalanceGate::Insufficient,
        }
    }

    pub fn allows_submission(self) -> bool {
        matches!(self, BalanceGate::Funded)
    }
}
