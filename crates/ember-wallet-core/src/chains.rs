//! Static registry for the two supported testnets, plus resolution of the
//! provider's composite chain identifier (`"eip155:<id>"`) into a numeric id.

use alloy::primitives::{address, Address, ChainId, B256};

pub const MEGAETH_TESTNET: ChainId = 6342;
pub const RISE_TESTNET: ChainId = 11155931;

/// Per-chain configuration used to parameterize submissions and links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainEntry {
    pub id: ChainId,
    pub name: &'static str,
    pub currency_symbol: &'static str,
    pub rpc_url: &'static str,
    pub explorer_tx_base: &'static str,
    pub faucet_url: &'static str,
    pub setter_address: Address,
}

impl ChainEntry {
    pub fn tx_url(&self, tx_hash: B256) -> String {
        format!("{}{tx_hash}", self.explorer_tx_base)
    }
}

pub const SUPPORTED_CHAINS: &[ChainEntry] = &[
    ChainEntry {
        id: MEGAETH_TESTNET,
        name: "MegaETH Testnet",
        currency_symbol: "ETH",
        rpc_url: "https://carrot.megaeth.com/rpc",
        explorer_tx_base: "http://megaexplorer.xyz/tx/",
        faucet_url: "https://testnet.megaeth.com",
        setter_address: address!("5fbdb2315678afecb367f032d93f642f64180aa3"),
    },
    ChainEntry {
        id: RISE_TESTNET,
        name: "RISE Testnet",
        currency_symbol: "ETH",
        rpc_url: "https://testnet.riselabs.xyz",
        explorer_tx_base: "https://explorer.testnet.riselabs.xyz/tx/",
        faucet_url: "https://faucet.testnet.riselabs.xyz/",
        setter_address: address!("e7f1725e7734ce288f8367e1bb143e90bb3f0512"),
    },
];

/// JSON ABI of the setter contract deployed on both testnets.
pub const SETTER_ABI_JSON: &str = r#"[
  {
    "type": "function",
    "name": "setValue",
    "inputs": [{ "name": "newValue", "type": "uint256" }],
    "outputs": [],
    "stateMutability": "nonpayable"
  }
]"#;

pub const SETTER_FUNCTION: &str = "setValue(uint256)";

pub fn chain_entry(id: ChainId) -> Option<&'static ChainEntry> {
    SUPPORTED_CHAINS.iter().find(|entry| entry.id == id)
}

/// Resolve a composite chain identifier such as `"eip155:6342"` to its
/// numeric chain id.
///
/// Malformed input (missing identifier, no separator, non-numeric suffix)
/// resolves to `None`; it never fails the caller. A present-but-malformed
/// identifier is logged at debug level so it stays distinguishable from a
/// disconnected wallet.
pub fn resolve_chain_id(composite: Option<&str>) -> Option<ChainId> {
    let raw = composite?;
    let Some((_, suffix)) = raw.split_once(':') else {
        tracing::debug!(identifier = raw, "chain identifier has no separator");
        return None;
    };
    match suffix.parse::<ChainId>() {
        Ok(id) => Some(id),
        Err(_) => {
            tracing::debug!(identifier = raw, "chain identifier suffix is not numeric");
            None
        }
    }
}
