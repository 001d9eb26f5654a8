//! In-memory credential index
//!
//! Keeps secret names per (namespace, registry) in insertion order. The
//! store can be marked unreachable to exercise lookup failures.

use super::normalize_registry;
use crate::domain::ports::SecretRetriever;
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

type IndexKey = (String, String);

/// In-memory [`SecretRetriever`] backend
pub struct InMemorySecretStore {
    index: RwLock<BTreeMap<IndexKey, Vec<String>>>,
    reachable: AtomicBool,
}

impl InMemorySecretStore {
    /// Create an empty, reachable store
    pub fn new() -> Self {
        Self {
            index: RwLock::new(BTreeMap::new()),
            reachable: AtomicBool::new(true),
        }
    }

    /// Replace the secrets registered for a registry
    pub fn set_secrets(&self, namespace: &str, registry: &str, names: Vec<String>) {
        self.index.write().insert(Self::key(namespace, registry), names);
    }

    /// Append a secret, keeping existing order and skipping duplicates
    pub fn add_secret(&self, namespace: &str, registry: &str, name: &str) {
        let mut index = self.index.write();
        let names = index.entry(Self::key(namespace, registry)).or_default();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    /// Drop every secret registered for a registry
    pub fn remove_registry(&self, namespace: &str, registry: &str) {
        self.index.write().remove(&Self::key(namespace, registry));
    }

    /// Toggle store reachability
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn key(namespace: &str, registry: &str) -> IndexKey {
        (namespace.to_string(), normalize_registry(registry))
    }
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretRetriever for InMemorySecretStore {
    async fn get_secrets(&self, namespace: &str, registry: &str) -> Result<Vec<String>> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(Error::secret_lookup(
                namespace,
                registry,
                "secret store unreachable",
            ));
        }

        Ok(self
            .index
            .read()
            .get(&Self::key(namespace, registry))
            .cloned()
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &str {
        "in-memory"
    }
}
