//! Domain Ports - Core trait definitions for the graph deployment operator
//!
//! These traits define the boundaries between claim construction, credential
//! lookup and the cluster. Adapters implement these traits to provide
//! concrete functionality.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Owner Identity
// =============================================================================

/// Minimal identity of the object that owns derived resources.
///
/// Claim construction only needs a name and a namespace, so it depends on
/// this capability instead of the full custom resource type.
pub trait OwnerIdentity {
    /// Name of the owning object
    fn owner_name(&self) -> String;

    /// Namespace of the owning object, `None` for cluster-scoped owners
    fn owner_namespace(&self) -> Option<String>;
}

/// Plain owner identity for callers that don't hold a custom resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerMeta {
    pub name: String,
    pub namespace: Option<String>,
}

impl OwnerMeta {
    /// Create a namespaced owner identity
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

impl OwnerIdentity for OwnerMeta {
    fn owner_name(&self) -> String {
        self.name.clone()
    }

    fn owner_namespace(&self) -> Option<String> {
        self.namespace.clone()
    }
}

impl std::fmt::Display for OwnerMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// =============================================================================
// Secret Retriever Port
// =============================================================================

/// Port for registry credential lookup.
///
/// Returns the names of the secrets that can pull images from `registry`
/// inside `namespace`. The order is stable while the backing store is
/// unchanged. An empty result means no credentials are configured and is
/// not an error; an unreachable store is reported as
/// [`Error::SecretLookup`](crate::error::Error::SecretLookup).
#[async_trait]
pub trait SecretRetriever: Send + Sync {
    /// Get the secret names associated with the registry
    async fn get_secrets(&self, namespace: &str, registry: &str) -> Result<Vec<String>>;

    /// Get backend name
    fn backend_name(&self) -> &str;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type SecretRetrieverRef = Arc<dyn SecretRetriever>;
