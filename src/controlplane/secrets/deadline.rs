//! Lookup deadline wrapper

use crate::domain::ports::SecretRetriever;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Wraps a [`SecretRetriever`] so that a lookup exceeding `timeout` fails
/// with [`Error::SecretLookup`].
pub struct DeadlineSecretRetriever<R> {
    inner: R,
    timeout: Duration,
}

impl<R: SecretRetriever> DeadlineSecretRetriever<R> {
    /// Wrap a retriever with a lookup deadline
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Configured deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl<R: SecretRetriever> SecretRetriever for DeadlineSecretRetriever<R> {
    async fn get_secrets(&self, namespace: &str, registry: &str) -> Result<Vec<String>> {
        let lookup = self.inner.get_secrets(namespace, registry);
        match tokio::time::timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    namespace = %namespace,
                    registry = %registry,
                    backend = self.inner.backend_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Secret lookup deadline exceeded"
                );
                Err(Error::secret_lookup(
                    namespace,
                    registry,
                    format!("lookup exceeded deadline of {:?}", self.timeout),
                ))
            }
        }
    }

    fn backend_name(&self) -> &str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controlplane::secrets::InMemorySecretStore;
    use assert_matches::assert_matches;

    struct SlowStore;

    #[async_trait]
    impl SecretRetriever for SlowStore {
        async fn get_secrets(&self, _namespace: &str, _registry: &str) -> Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec!["late".into()])
        }

        fn backend_name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_lookup_error() {
        let retriever = DeadlineSecretRetriever::new(SlowStore, Duration::from_millis(20));
        let err = retriever
            .get_secrets("team-x", "registry.example.com")
            .await
            .unwrap_err();
        assert_matches!(err, Error::SecretLookup { .. });
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_passes_through_within_deadline() {
        let store = InMemorySecretStore::new();
        store.set_secrets("team-x", "registry.example.com", vec!["docker-cred-1".into()]);

        let retriever = DeadlineSecretRetriever::new(store, Duration::from_secs(1));
        assert_eq!(retriever.backend_name(), "in-memory");
        assert_eq!(
            retriever
                .get_secrets("team-x", "registry.example.com")
                .await
                .unwrap(),
            vec!["docker-cred-1"]
        );
    }
}
