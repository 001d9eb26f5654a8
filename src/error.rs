//! Error types for the Graph Deployment Operator
//!
//! Provides structured error types for claim construction, registry
//! credential lookup and the reconciler.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the operator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Kubernetes Errors
    // =========================================================================
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Missing object key: {0}")]
    MissingObjectKey(&'static str),

    // =========================================================================
    // Storage Claim Errors
    // =========================================================================
    #[error("Duplicate claim name {name} resolved for {owner}")]
    DuplicateClaimName { owner: String, name: String },

    // =========================================================================
    // Registry Credential Errors
    // =========================================================================
    #[error("Secret lookup failed for registry {registry} in namespace {namespace}: {reason}")]
    SecretLookup {
        namespace: String,
        registry: String,
        reason: String,
    },

    #[error("Docker config parse error: {0}")]
    DockerConfigParse(String),

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("YAML serialize error: {0}")]
    YamlSerialize(#[from] serde_yaml::Error),
}

/// Action to take on error during reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Requeue with exponential backoff
    RequeueWithBackoff,
    /// Requeue after specific duration
    RequeueAfter(Duration),
    /// Don't requeue, wait for changes
    NoRequeue,
}

impl Error {
    /// Build a lookup failure for a (namespace, registry) pair
    pub fn secret_lookup(
        namespace: impl Into<String>,
        registry: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::SecretLookup {
            namespace: namespace.into(),
            registry: registry.into(),
            reason: reason.into(),
        }
    }

    /// Determine what action to take for this error
    pub fn action(&self) -> ErrorAction {
        match self {
            // Transient errors - retry with backoff
            Error::Kube(_) | Error::SecretLookup { .. } => ErrorAction::RequeueWithBackoff,

            // Spec/configuration errors - wait for the resource to change
            Error::Configuration(_)
            | Error::MissingObjectKey(_)
            | Error::DuplicateClaimName { .. } => ErrorAction::NoRequeue,

            // All other errors - retry with backoff
            _ => ErrorAction::RequeueWithBackoff,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        !matches!(self.action(), ErrorAction::NoRequeue)
    }

    /// Check if this error is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Kube(_) | Error::SecretLookup { .. })
    }
}

/// Result type alias for the operator
pub type Result<T> = std::result::Result<T, Error>;
