//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use rand::RngCore;

use secret_registry::{CallContext, Registry, RegistryConfig};
use secret_registry_core::{Height, Principal, SALT_LEN};
use secret_registry_store::{MemoryStore, Store};

/// A deterministic principal derived from a human-readable label.
pub fn principal(label: &str) -> Principal {
    Principal::from_bytes(*blake3::hash(label.as_bytes()).as_bytes())
}

/// Create several distinct principals for multi-party tests.
pub fn multi_party_principals(count: usize) -> Vec<Principal> {
    (0..count).map(|i| principal(&format!("party-{}", i))).collect()
}

/// A fresh random salt.
pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// A registry plus an environment height the test controls.
pub struct TestChain<S: Store> {
    registry: Registry<S>,
    height: Height,
}

impl TestChain<MemoryStore> {
    /// A chain over an empty memory store, starting at height 1.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), RegistryConfig::default())
    }
}

impl Default for TestChain<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> TestChain<S> {
    /// A chain over the given store and config, starting at height 1.
    pub fn with_store(store: S, config: RegistryConfig) -> Self {
        Self {
            registry: Registry::new(store, config),
            height: Height::new(1),
        }
    }

    /// The registry under test.
    pub fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Current height.
    pub fn height(&self) -> Height {
        self.height
    }

    /// Move the height forward by `blocks`. Returns the new height.
    pub fn advance(&mut self, blocks: u64) -> Height {
        self.height = self.height.after(blocks);
        self.height
    }

    /// Context for a call by `caller` at the current height.
    pub fn call(&self, caller: Principal) -> CallContext {
        CallContext::new(caller, self.height)
    }
}
