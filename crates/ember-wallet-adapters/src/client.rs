//! JSON-RPC wallet client, built per (account, chain) pair from a network
//! provider handle.

use alloy::primitives::{Address, B256};
use serde_json::json;
use tracing::debug;

use ember_wallet_core::{
    ChainEntry, ClientFactoryPort, ClientKey, ClientPort, ContractCall, PortError,
};

use crate::abi::encode_calldata;
use crate::provider::{json_chain_id_to_u64, parse_tx_hash, ProviderHandle};
use crate::session::deterministic_hash;

#[derive(Debug, Clone, Default)]
pub struct WalletClientFactory;

impl ClientFactoryPort for WalletClientFactory {
    type Provider = ProviderHandle;
    type Client = RpcWalletClient;

    async fn build_client(
        &self,
        account: Address,
        chain: &'static ChainEntry,
        provider: ProviderHandle,
    ) -> Result<RpcWalletClient, PortError> {
        // A transport-backed handle must actually be on the chain the client
        // is being bound to.
        if let ProviderHandle::Http { .. } = &provider {
            let reported = provider.request("eth_chainId", json!([])).await?;
            let reported = json_chain_id_to_u64(&reported)?;
            if reported != chain.id {
                return Err(PortError::Validation(format!(
                    "provider reports chain {reported}, expected {}",
                    chain.id
                )));
            }
        }
        debug!(%account, chain_id = chain.id, "wallet client constructed");
        Ok(RpcWalletClient {
            key: ClientKey {
                address: account,
                chain_id: chain.id,
            },
            provider,
        })
    }
}

/// A wallet client valid only for the (account, chain) pair it was built
/// from.
pub struct RpcWalletClient {
    key: ClientKey,
    provider: ProviderHandle,
}

impl ClientPort for RpcWalletClient {
    fn key(&self) -> ClientKey {
        self.key
    }

    async fn write_contract(&self, call: &ContractCall) -> Result<B256, PortError> {
        if call.chain_id != self.key.chain_id {
            return Err(PortError::Validation(format!(
                "call targets chain {}, client is bound to {}",
                call.chain_id, self.key.chain_id
            )));
        }
        let data = encode_calldata(&call.abi_json, &call.function, &call.args)?;
        let payload = json!({
            "from": call.account,
            "to": call.contract,
            "data": data,
        });
        match &self.provider {
            ProviderHandle::Deterministic => deterministic_hash(&payload),
            handle @ ProviderHandle::Http { .. } => {
                let result = handle.request("eth_sendTransaction", json!([payload])).await?;
                parse_tx_hash(&result)
            }
        }
    }
}
