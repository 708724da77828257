//! Chain-aware wallet client lifecycle.
//!
//! The manager owns at most one client, always scoped to the exact
//! (address, chain) pair it was built from. Any input change discards the
//! current client and starts a fresh build; a build that finishes after the
//! key has moved on is dropped without touching state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::chains::{chain_entry, resolve_chain_id};
use crate::domain::{ClientKey, ClientState};
use crate::ports::{ClientFactoryPort, SessionPort, WalletPort};

pub struct ClientManager<F: ClientFactoryPort> {
    factory: F,
    inner: Mutex<Lifecycle<F::Client>>,
}

struct Lifecycle<C> {
    /// Bumped on every key change and teardown; a build commits its result
    /// only when the generation it started under is still current.
    generation: u64,
    key: Option<ClientKey>,
    state: ClientState,
    client: Option<Arc<C>>,
}

impl<C> Default for Lifecycle<C> {
    fn default() -> Self {
        Self {
            generation: 0,
            key: None,
            state: ClientState::Absent,
            client: None,
        }
    }
}

impl<F: ClientFactoryPort> ClientManager<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            inner: Mutex::new(Lifecycle::default()),
        }
    }

    pub fn state(&self) -> ClientState {
        self.lock().state
    }

    pub fn current_key(&self) -> Option<ClientKey> {
        self.lock().key
    }

    /// The current client, if one is `Ready`. Callers hold the returned
    /// handle only for the duration of a single call; the manager drops its
    /// own handle the moment the key changes.
    pub fn client(&self) -> Option<Arc<F::Client>> {
        self.lock().client.clone()
    }

    /// Re-evaluate the watched (address, chain) key against the session and
    /// converge the client towards it.
    ///
    /// Every failure path degrades to `Absent` with a diagnostic; none is
    /// surfaced as an error because the caller keeps functioning with a null
    /// client.
    pub async fn refresh<S>(&self, session: &S) -> ClientState
    where
        S: SessionPort,
        S::Wallet: WalletPort<Provider = F::Provider>,
    {
        let Some(wallet) = session.embedded_wallet() else {
            return self.teardown("no embedded wallet connected");
        };
        let composite = wallet.chain_identifier();
        let Some(chain_id) = resolve_chain_id(composite.as_deref()) else {
            return self.teardown("wallet chain id not resolvable");
        };
        let Some(chain) = chain_entry(chain_id) else {
            warn!(chain_id, "wallet is on a chain outside the registry");
            return self.teardown("unsupported chain");
        };

        let key = ClientKey {
            address: wallet.address(),
            chain_id,
        };
        let generation = {
            let mut guard = self.lock();
            // Same key: a build is already done, in flight, or has failed.
            // A failed build is not retried until the key changes.
            if guard.key == Some(key) {
                return guard.state;
            }
            guard.generation += 1;
            guard.key = Some(key);
            guard.state = ClientState::Constructing;
            guard.client = None;
            guard.generation
        };

        debug!(address = %key.address, chain_id, "building wallet client");
        let built = match wallet.network_provider().await {
            Ok(provider) => {
                self.factory
                    .build_client(key.address, chain, provider)
                    .await
            }
            Err(e) => Err(e),
        };

        let mut guard = self.lock();
        if guard.generation != generation {
            debug!(chain_id, "discarding client build for a superseded key");
            return guard.state;
        }
        match built {
            Ok(client) => {
                guard.client = Some(Arc::new(client));
                guard.state = ClientState::Ready;
                info!(address = %key.address, chain_id, "wallet client ready");
            }
            Err(e) => {
                guard.client = None;
                guard.state = ClientState::Absent;
                warn!(error = %e, chain_id, "wallet client construction failed");
            }
        }
        guard.state
    }

    fn teardown(&self, reason: &'static str) -> ClientState {
        let mut guard = self.lock();
        if guard.key.is_some() || guard.client.is_some() || guard.state != ClientState::Absent {
            guard.generation += 1;
            guard.key = None;
            guard.client = None;
            guard.state = ClientState::Absent;
            debug!(reason, "wallet client torn down");
        }
        ClientState::Absent
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle<F::Client>> {
        // State updates are plain field writes; a poisoned lock still holds
        // consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
