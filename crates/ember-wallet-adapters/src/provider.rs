//! The opaque network provider handle handed out by a wallet, plus shared
//! JSON-RPC response helpers.

use alloy::primitives::{ChainId, B256};
use serde_json::{json, Value};

use ember_wallet_core::PortError;

/// A network provider handle obtained from a wallet. Consumers treat it as
/// an opaque transport for submitting requests to the wallet's chain.
#[derive(Debug, Clone)]
pub enum ProviderHandle {
    /// In-memory handle with no transport; consumers simulate submission.
    Deterministic,
    /// JSON-RPC over HTTP against an EIP-1193-shaped proxy endpoint.
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl ProviderHandle {
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, PortError> {
        match self {
            ProviderHandle::Deterministic => Err(PortError::NotImplemented(
                "deterministic provider handle has no transport",
            )),
            ProviderHandle::Http { base_url, client } => {
                let payload = json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": method,
                    "params": params,
                });
                let response = client
                    .post(base_url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| PortError::Transport(format!("provider request failed: {e}")))?;
                let status = response.status();
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| {
                        PortError::Transport(format!("provider json decode failed: {e}"))
                    })?;
                if !status.is_success() {
                    return Err(PortError::Transport(format!(
                        "provider status {status}: {body}"
                    )));
                }
                if let Some(err) = body.get("error") {
                    return Err(PortError::Rejected(format!("provider returned error: {err}")));
                }
                body.get("result")
                    .cloned()
                    .ok_or_else(|| PortError::Transport("provider response missing result".to_owned()))
            }
        }
    }
}

pub(crate) fn json_chain_id_to_u64(value: &Value) -> Result<ChainId, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("chain id must be string or number".to_owned()))?;
    parse_chain_id_str(raw)
}

pub(crate) fn parse_chain_id_str(raw: &str) -> Result<ChainId, PortError> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex chain id: {e}")))
    } else {
        raw.parse()
            .map_err(|e| PortError::Validation(format!("invalid chain id: {e}")))
    }
}

pub(crate) fn parse_tx_hash(value: &Value) -> Result<B256, PortError> {
    let raw = value.as_str().ok_or_else(|| {
        PortError::Transport("transaction hash must be a hex string".to_owned())
    })?;
    raw.parse()
        .map_err(|e| PortError::Validation(format!("invalid transaction hash: {e}")))
}
