//! Native balance adapter. Live mode queries each chain's public RPC
//! endpoint from the registry; deterministic mode serves a configured
//! balance so the demo runs offline.

use std::time::Duration;

use alloy::primitives::{Address, ChainId, U256};
use serde_json::{json, Value};

use ember_wallet_core::{chain_entry, BalancePort, BalanceSnapshot, PortError};

#[derive(Debug, Clone)]
pub struct RpcBalanceAdapter {
    mode: BalanceMode,
}

#[derive(Debug, Clone)]
enum BalanceMode {
    Deterministic {
        balance: U256,
    },
    Live {
        client: reqwest::Client,
        endpoint_override: Option<String>,
    },
}

impl RpcBalanceAdapter {
    pub fn deterministic(balance: U256) -> Self {
        Self {
            mode: BalanceMode::Deterministic { balance },
        }
    }

    pub fn live(timeout_ms: u64) -> Result<Self, PortError> {
        Self::build_live(timeout_ms, None)
    }

    /// Live mode against a fixed endpoint instead of the registry RPC.
    pub fn live_with_endpoint(timeout_ms: u64, endpoint: String) -> Result<Self, PortError> {
        Self::build_live(timeout_ms, Some(endpoint))
    }

    fn build_live(timeout_ms: u64, endpoint_override: Option<String>) -> Result<Self, PortError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build balance http client: {e}")))?;
        Ok(Self {
            mode: BalanceMode::Live {
                client,
                endpoint_override,
            },
        })
    }
}

impl BalancePort for RpcBalanceAdapter {
    async fn fetch_balance(
        &self,
        address: Address,
        chain_id: ChainId,
    ) -> Result<BalanceSnapshot, PortError> {
        let chain = chain_entry(chain_id).ok_or_else(|| {
            PortError::Validation(format!("chain {chain_id} is not in the registry"))
        })?;
        match &self.mode {
            BalanceMode::Deterministic { balance } => {
                Ok(snapshot_for(*balance, chain.currency_symbol))
            }
            BalanceMode::Live {
                client,
                endpoint_override,
            } => {
                let url = endpoint_override.as_deref().unwrap_or(chain.rpc_url);
                let payload = json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "eth_getBalance",
                    "params": [address, "latest"],
                });
                let response = client
                    .post(url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| PortError::Transport(format!("balance request failed: {e}")))?;
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| PortError::Transport(format!("balance json decode failed: {e}")))?;
                if let Some(err) = body.get("error") {
                    return Err(PortError::Rejected(format!("balance rpc error: {err}")));
                }
                let raw = body
                    .get("result")
                    .and_then(Value::as_str)
                    .ok_or_else(|| PortError::Transport("balance rpc missing result".to_owned()))?;
                let value = U256::from_str_radix(raw.trim_start_matches("0x"), 16)
                    .map_err(|e| PortError::Validation(format!("invalid balance: {e}")))?;
                Ok(snapshot_for(value, chain.currency_symbol))
            }
        }
    }
}

fn snapshot_for(value: U256, symbol: &str) -> BalanceSnapshot {
    BalanceSnapshot {
        value,
        formatted: format_ether(value),
        symbol: symbol.to_owned(),
    }
}

/// Format a wei amount as a decimal ether string, trailing zeros trimmed.
pub fn format_ether(value: U256) -> String {
    let wei_per_ether = U256::from(10u128.pow(18));
    let whole = value / wei_per_ether;
    let frac = value % wei_per_ether;
    if frac.is_zero() {
        return format!("{whole}.0");
    }
    let frac = format!("{frac:0>18}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::format_ether;
    use alloy::primitives::U256;

    fn wei(raw: u128) -> U256 {
        U256::from(raw)
    }

    #[test]
    fn formats_whole_amounts() {
        assert_eq!(format_ether(U256::ZERO), "0.0");
        assert_eq!(format_ether(wei(1_000_000_000_000_000_000)), "1.0");
        assert_eq!(format_ether(wei(42_000_000_000_000_000_000)), "42.0");
    }

    #[test]
    fn formats_fractional_amounts() {
        assert_eq!(format_ether(wei(1_500_000_000_000_000_000)), "1.5");
        assert_eq!(format_ether(wei(10_000_000_000_000_000)), "0.01");
        assert_eq!(format_ether(wei(1)), "0.000000000000000001");
    }
}
