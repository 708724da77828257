//! Guarded transaction submission.
//!
//! Two independent operations (self-transfer, setter contract write), each
//! serialized against itself by an advisory `busy` flag. The flag is cleared
//! on every exit path, including panics, by a drop guard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy::primitives::{ChainId, B256, U256};
use thiserror::Error;
use tracing::{info, warn};

use crate::chains::{chain_entry, SETTER_ABI_JSON, SETTER_FUNCTION};
use crate::domain::{ContractCall, SubmissionKind, SubmissionState};
use crate::ports::{ClientPort, PortError, SessionPort, WalletPort};

/// The fixed argument sent to `setValue`.
pub const SETTER_TEST_VALUE: &str = "2";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0} submission already in flight")]
    Busy(SubmissionKind),
    #[error("no embedded wallet connected")]
    NotConnected,
    #[error("wallet client is not ready")]
    ClientNotReady,
    #[error("chain {0} is not supported")]
    UnsupportedChain(ChainId),
    #[error(transparent)]
    Port(#[from] PortError),
}

#[derive(Default)]
pub struct SubmissionController {
    transfer: Mutex<SubmissionState>,
    contract: Mutex<SubmissionState>,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transfer_state(&self) -> SubmissionState {
        slot_lock(&self.transfer).clone()
    }

    pub fn contract_state(&self) -> SubmissionState {
        slot_lock(&self.contract).clone()
    }

    /// Send a zero-value transfer to the wallet's own address through the
    /// session provider's submission capability.
    pub async fn send_self_transfer<S: SessionPort>(
        &self,
        session: &S,
    ) -> Result<B256, SubmitError> {
        let guard = BusyGuard::acquire(&self.transfer, SubmissionKind::Transfer)?;
        let wallet = session.embedded_wallet().ok_or(SubmitError::NotConnected)?;
        let to = wallet.address();
        match session.send_value_transfer(to, U256::ZERO).await {
            Ok(hash) => {
                guard.record(hash);
                info!(%hash, %to, "test transfer submitted");
                Ok(hash)
            }
            Err(e) => {
                warn!(error = %e, "test transfer failed");
                Err(e.into())
            }
        }
    }

    /// Call `setValue(2)` on the setter contract deployed for the client's
    /// chain.
    pub async fn write_setter_contract<C: ClientPort>(
        &self,
        client: Option<Arc<C>>,
    ) -> Result<B256, SubmitError> {
        let guard = BusyGuard::acquire(&self.contract, SubmissionKind::ContractWrite)?;
        let client = client.ok_or(SubmitError::ClientNotReady)?;
        let key = client.key();
        let chain = chain_entry(key.chain_id).ok_or(SubmitError::UnsupportedChain(key.chain_id))?;
        let call = ContractCall {
            account: key.address,
            contract: chain.setter_address,
            abi_json: SETTER_ABI_JSON.to_owned(),
            function: SETTER_FUNCTION.to_owned(),
            args: vec![SETTER_TEST_VALUE.to_owned()],
            chain_id: key.chain_id,
        };
        match client.write_contract(&call).await {
            Ok(hash) => {
                guard.record(hash);
                info!(%hash, contract = %call.contract, "contract write submitted");
                Ok(hash)
            }
            Err(e) => {
                warn!(error = %e, contract = %call.contract, "contract write failed");
                Err(e.into())
            }
        }
    }

    /// Ask the wallet to switch chain. A successful switch clears both
    /// operations' last result so a hash from the previous network is never
    /// displayed; the busy flags are left alone.
    pub async fn switch_chain<S: SessionPort>(
        &self,
        session: &S,
        target: ChainId,
    ) -> Result<(), SubmitError> {
        if chain_entry(target).is_none() {
            return Err(SubmitError::UnsupportedChain(target));
        }
        let wallet = session.embedded_wallet().ok_or(SubmitError::NotConnected)?;
        match wallet.switch_chain(target).await {
            Ok(()) => {
                slot_lock(&self.transfer).last_result_id = None;
                slot_lock(&self.contract).last_result_id = None;
                info!(chain_id = target, "switched chain");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, chain_id = target, "chain switch failed");
                Err(e.into())
            }
        }
    }
}

/// Holds a slot's `busy` flag for the duration of one submission and clears
/// it on drop.
struct BusyGuard<'a> {
    slot: &'a Mutex<SubmissionState>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(
        slot: &'a Mutex<SubmissionState>,
        kind: SubmissionKind,
    ) -> Result<Self, SubmitError> {
        let mut state = slot_lock(slot);
        if state.busy {
            return Err(SubmitError::Busy(kind));
        }
        state.busy = true;
        Ok(Self { slot })
    }

    fn record(&self, hash: B256) {
        slot_lock(self.slot).last_result_id = Some(hash);
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        slot_lock(self.slot).busy = false;
    }
}

fn slot_lock(slot: &Mutex<SubmissionState>) -> MutexGuard<'_, SubmissionState> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
