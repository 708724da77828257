#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, ChainId, B256, U256};
use tokio::sync::{mpsc, Notify};

use ember_wallet_core::{
    BalancePort, BalanceSnapshot, ChainEntry, ClientFactoryPort, ClientKey, ClientPort,
    ContractCall, PortError, SessionPort, WalletPort,
};

pub fn test_address() -> Address {
    Address::repeat_byte(0xAA)
}

pub fn composite(chain_id: ChainId) -> String {
    format!("eip155:{chain_id}")
}

pub fn dead_hash() -> B256 {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xde;
    bytes[1] = 0xad;
    B256::new(bytes)
}

pub const DEFAULT_TRANSFER_HASH: B256 = B256::repeat_byte(0xdd);
pub const DEFAULT_WRITE_HASH: B256 = B256::repeat_byte(0xcc);

#[derive(Clone, Default)]
struct WalletFixture {
    address: Address,
    composite: Option<String>,
    switch_fails: bool,
    provider_fails: bool,
}

#[derive(Default)]
struct SessionInner {
    authenticated: bool,
    wallet: Option<WalletFixture>,
}

/// Scripted behavior for the session-level transfer capability.
#[derive(Default)]
pub struct TransferScript {
    calls: AtomicUsize,
    sent: Mutex<Vec<(Address, U256)>>,
    gate: Mutex<Option<Arc<Notify>>>,
    results: Mutex<Vec<Result<B256, String>>>,
    started: Mutex<Option<mpsc::UnboundedSender<()>>>,
}

#[derive(Clone, Default)]
pub struct MockSession {
    inner: Arc<Mutex<SessionInner>>,
    transfers: Arc<TransferScript>,
}

impl MockSession {
    pub fn connected(address: Address, chain_id: ChainId) -> Self {
        let session = Self::default();
        session.connect(address, Some(composite(chain_id)));
        session
    }

    pub fn connect(&self, address: Address, composite: Option<String>) {
        let mut inner = self.inner.lock().unwrap();
        inner.authenticated = true;
        inner.wallet = Some(WalletFixture {
            address,
            composite,
            ..WalletFixture::default()
        });
    }

    pub fn disconnect(&self) {
        self.inner.lock().unwrap().wallet = None;
    }

    pub fn set_chain(&self, chain_id: ChainId) {
        if let Some(wallet) = self.inner.lock().unwrap().wallet.as_mut() {
            wallet.composite = Some(composite(chain_id));
        }
    }

    pub fn fail_switch(&self) {
        if let Some(wallet) = self.inner.lock().unwrap().wallet.as_mut() {
            wallet.switch_fails = true;
        }
    }

    pub fn fail_provider(&self) {
        if let Some(wallet) = self.inner.lock().unwrap().wallet.as_mut() {
            wallet.provider_fails = true;
        }
    }

    /// Make subsequent transfers block until the returned notify fires.
    pub fn gate_transfers(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.transfers.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    /// Receive a `()` the moment each transfer reaches the port.
    pub fn transfer_events(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.transfers.started.lock().unwrap() = Some(tx);
        rx
    }

    pub fn push_transfer_result(&self, result: Result<B256, &str>) {
        self.transfers
            .results
            .lock()
            .unwrap()
            .push(result.map_err(str::to_owned));
    }

    pub fn transfer_calls(&self) -> usize {
        self.transfers.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(Address, U256)> {
        self.transfers.sent.lock().unwrap().clone()
    }
}

pub struct MockProvider;

pub struct MockWallet {
    fixture: WalletFixture,
    inner: Arc<Mutex<SessionInner>>,
}

impl WalletPort for MockWallet {
    type Provider = MockProvider;

    fn address(&self) -> Address {
        self.fixture.address
    }

    fn chain_identifier(&self) -> Option<String> {
        self.fixture.composite.clone()
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), PortError> {
        if self.fixture.switch_fails {
            return Err(PortError::Rejected("switch declined by provider".to_owned()));
        }
        if let Some(wallet) = self.inner.lock().unwrap().wallet.as_mut() {
            wallet.composite = Some(composite(chain_id));
        }
        Ok(())
    }

    async fn network_provider(&self) -> Result<MockProvider, PortError> {
        if self.fixture.provider_fails {
            return Err(PortError::Unavailable("no network provider handle".to_owned()));
        }
        Ok(MockProvider)
    }
}

impl SessionPort for MockSession {
    type Wallet = MockWallet;

    fn authenticated(&self) -> bool {
        self.inner.lock().unwrap().authenticated
    }

    async fn login(&self) -> Result<(), PortError> {
        self.inner.lock().unwrap().authenticated = true;
        Ok(())
    }

    async fn logout(&self) -> Result<(), PortError> {
        let mut inner = self.inner.lock().unwrap();
        inner.authenticated = false;
        inner.wallet = None;
        Ok(())
    }

    fn wallets(&self) -> Vec<MockWallet> {
        self.embedded_wallet().into_iter().collect()
    }

    fn embedded_wallet(&self) -> Option<MockWallet> {
        let inner = self.inner.lock().unwrap();
        inner.wallet.clone().map(|fixture| MockWallet {
            fixture,
            inner: Arc::clone(&self.inner),
        })
    }

    async fn send_value_transfer(&self, to: Address, value: U256) -> Result<B256, PortError> {
        self.transfers.calls.fetch_add(1, Ordering::SeqCst);
        self.transfers.sent.lock().unwrap().push((to, value));
        if let Some(tx) = self.transfers.started.lock().unwrap().as_ref() {
            let _ = tx.send(());
        }
        let gate = self.transfers.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let scripted = self.transfers.results.lock().unwrap().pop();
        match scripted {
            Some(Ok(hash)) => Ok(hash),
            Some(Err(message)) => Err(PortError::Rejected(message)),
            None => Ok(DEFAULT_TRANSFER_HASH),
        }
    }
}

/// Scripted behavior for clients handed out by [`MockFactory`].
#[derive(Default)]
pub struct ClientScript {
    calls: AtomicUsize,
    recorded: Mutex<Vec<ContractCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
    fail_next: AtomicBool,
    started: Mutex<Option<mpsc::UnboundedSender<()>>>,
}

impl ClientScript {
    pub fn gate_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn write_events(&self) -> mpsc::UnboundedReceiver<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.started.lock().unwrap() = Some(tx);
        rx
    }

    pub fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn write_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<ContractCall> {
        self.recorded.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct FactoryInner {
    builds: AtomicUsize,
    gates: Mutex<HashMap<ChainId, Arc<Notify>>>,
    fail_chains: Mutex<Vec<ChainId>>,
    build_events: Mutex<Option<mpsc::UnboundedSender<ChainId>>>,
    client_script: Arc<ClientScript>,
}

#[derive(Clone, Default)]
pub struct MockFactory {
    inner: Arc<FactoryInner>,
}

impl MockFactory {
    pub fn build_count(&self) -> usize {
        self.inner.builds.load(Ordering::SeqCst)
    }

    /// Make builds for `chain_id` block until the returned notify fires.
    pub fn gate_chain(&self, chain_id: ChainId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner
            .gates
            .lock()
            .unwrap()
            .insert(chain_id, Arc::clone(&gate));
        gate
    }

    pub fn fail_chain(&self, chain_id: ChainId) {
        self.inner.fail_chains.lock().unwrap().push(chain_id);
    }

    /// Receive each build's chain id the moment the build starts.
    pub fn build_events(&self) -> mpsc::UnboundedReceiver<ChainId> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.inner.build_events.lock().unwrap() = Some(tx);
        rx
    }

    pub fn client_script(&self) -> Arc<ClientScript> {
        Arc::clone(&self.inner.client_script)
    }
}

impl ClientFactoryPort for MockFactory {
    type Provider = MockProvider;
    type Client = MockClient;

    async fn build_client(
        &self,
        account: Address,
        chain: &'static ChainEntry,
        _provider: MockProvider,
    ) -> Result<MockClient, PortError> {
        self.inner.builds.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self.inner.build_events.lock().unwrap().as_ref() {
            let _ = tx.send(chain.id);
        }
        let gate = self.inner.gates.lock().unwrap().get(&chain.id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.inner.fail_chains.lock().unwrap().contains(&chain.id) {
            return Err(PortError::Transport("client construction refused".to_owned()));
        }
        Ok(MockClient {
            key: ClientKey {
                address: account,
                chain_id: chain.id,
            },
            script: Arc::clone(&self.inner.client_script),
        })
    }
}

pub struct MockClient {
    key: ClientKey,
    script: Arc<ClientScript>,
}

impl ClientPort for MockClient {
    fn key(&self) -> ClientKey {
        self.key
    }

    async fn write_contract(&self, call: &ContractCall) -> Result<B256, PortError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script.recorded.lock().unwrap().push(call.clone());
        if let Some(tx) = self.script.started.lock().unwrap().as_ref() {
            let _ = tx.send(());
        }
        let gate = self.script.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.script.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::Rejected("execution reverted".to_owned()));
        }
        Ok(DEFAULT_WRITE_HASH)
    }
}

#[derive(Default)]
struct BalanceInner {
    calls: AtomicUsize,
    snapshots: Mutex<HashMap<(Address, ChainId), BalanceSnapshot>>,
    fail_next: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MockBalance {
    inner: Arc<BalanceInner>,
}

impl MockBalance {
    pub fn set(&self, address: Address, chain_id: ChainId, value: U256, formatted: &str) {
        self.inner.snapshots.lock().unwrap().insert(
            (address, chain_id),
            BalanceSnapshot {
                value,
                formatted: formatted.to_owned(),
                symbol: "ETH".to_owned(),
            },
        );
    }

    pub fn fail_next(&self) {
        self.inner.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }
}

impl BalancePort for MockBalance {
    async fn fetch_balance(
        &self,
        address: Address,
        chain_id: ChainId,
    ) -> Result<BalanceSnapshot, PortError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PortError::Transport("rpc unreachable".to_owned()));
        }
        self.inner
            .snapshots
            .lock()
            .unwrap()
            .get(&(address, chain_id))
            .cloned()
            .ok_or_else(|| PortError::Transport("no balance scripted".to_owned()))
    }
}
