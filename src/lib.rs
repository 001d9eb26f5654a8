//! Graph Deployment Operator
//!
//! A Kubernetes operator that reconciles `GraphDeployment` resources into
//! concrete PersistentVolumeClaims and resolves the registry credentials
//! their workloads need to pull images.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                  GraphDeployment Reconciler                    │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────┐   ┌───────────────────────────┐  │
//! │  │     Claim Builder       │   │     Secret Retriever      │  │
//! │  │  (name resolution,      │   │  (in-memory, cluster,     │  │
//! │  │   PVC construction)     │   │   deadline wrapper)       │  │
//! │  └────────────┬────────────┘   └─────────────┬─────────────┘  │
//! │               │                              │                │
//! │               └──────────────┬───────────────┘                │
//! │                    ┌─────────┴─────────┐                      │
//! │                    │  OwnerIdentity /  │                      │
//! │                    │  SecretRetriever  │                      │
//! │                    │      ports        │                      │
//! │                    └───────────────────┘                      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`controlplane`]: Claim construction, credential lookup and reconciler
//! - [`crd`]: Custom Resource Definitions
//! - [`domain`]: Core domain traits
//! - [`error`]: Error types and handling

pub mod controlplane;
pub mod crd;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use controlplane::{
    build_claim, build_claims, image_pull_secrets, registry_host, resolve_claim_name,
    Context, DeadlineSecretRetriever, InMemorySecretStore, KubeSecretRetriever, OperatorConfig,
};

pub use crd::{AccessMode, GraphDeployment, GraphDeploymentSpec, GraphDeploymentStatus, PvcConfig};

pub use domain::ports::{OwnerIdentity, OwnerMeta, SecretRetriever, SecretRetrieverRef};

pub use error::{Error, ErrorAction, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
