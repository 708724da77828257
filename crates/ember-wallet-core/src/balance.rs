//! Native balance cache keyed by the active (address, chain) pair.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::domain::{BalanceGate, BalanceSnapshot, ClientKey};
use crate::ports::BalancePort;

pub struct BalanceObserver<B: BalancePort> {
    port: B,
    inner: Mutex<BalanceCache>,
}

#[derive(Default)]
struct BalanceCache {
    /// Bumped on every key change and manual refetch so a slow fetch for an
    /// old key cannot overwrite a newer snapshot.
    generation: u64,
    key: Option<ClientKey>,
    snapshot: Option<BalanceSnapshot>,
}

impl<B: BalancePort> BalanceObserver<B> {
    pub fn new(port: B) -> Self {
        Self {
            port,
            inner: Mutex::new(BalanceCache::default()),
        }
    }

    pub fn snapshot(&self) -> Option<BalanceSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn gate(&self) -> BalanceGate {
        BalanceGate::from_snapshot(self.lock().snapshot.as_ref())
    }

    /// Re-evaluate the watched key. An unchanged key returns the cached
    /// snapshot's gate without touching the port; a changed key drops the
    /// cached snapshot and fetches a fresh one.
    pub async fn observe(&self, key: Option<ClientKey>) -> BalanceGate {
        let generation = {
            let mut cache = self.lock();
            if cache.key == key {
                return BalanceGate::from_snapshot(cache.snapshot.as_ref());
            }
            cache.generation += 1;
            cache.key = key;
            cache.snapshot = None;
            cache.generation
        };
        let Some(key) = key else {
            return BalanceGate::Loading;
        };
        self.fetch(key, generation).await
    }

    /// Manual refetch for the current key.
    pub async fn refetch(&self) -> BalanceGate {
        let (key, generation) = {
            let mut cache = self.lock();
            let Some(key) = cache.key else {
                return BalanceGate::Loading;
            };
            cache.generation += 1;
            (key, cache.generation)
        };
        self.fetch(key, generation).await
    }

    async fn fetch(&self, key: ClientKey, generation: u64) -> BalanceGate {
        let result = self.port.fetch_balance(key.address, key.chain_id).await;
        let mut cache = self.lock();
        if cache.generation != generation {
            debug!(chain_id = key.chain_id, "discarding balance fetch for a superseded key");
            return BalanceGate::from_snapshot(cache.snapshot.as_ref());
        }
        match result {
            Ok(snapshot) => cache.snapshot = Some(snapshot),
            // The stale-or-absent snapshot stands; retry is manual.
            Err(e) => warn!(error = %e, chain_id = key.chain_id, "balance fetch failed"),
        }
        BalanceGate::from_snapshot(cache.snapshot.as_ref())
    }

    fn lock(&self) -> MutexGuard<'_, BalanceCache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
