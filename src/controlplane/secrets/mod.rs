//! Registry Credential Lookup
//!
//! Provides [`SecretRetriever`] backends:
//! - InMemory: ordered in-memory index, used in tests and by embedding callers
//! - Cluster: dockerconfigjson secrets read through the Kubernetes API
//! - Deadline: wraps another backend with a lookup deadline
//!
//! Also the helpers used when building pod templates: extracting the
//! registry host from an image reference and turning a lookup result into
//! `imagePullSecrets` references.

pub mod cluster;
pub mod deadline;
pub mod memory;

pub use cluster::*;
pub use deadline::*;
pub use memory::*;

use crate::domain::ports::SecretRetriever;
use crate::error::Result;
use k8s_openapi::api::core::v1::LocalObjectReference;
use tracing::debug;

/// Registry assumed for image references without an explicit host
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Registry host of an image reference.
///
/// The first path component is a host when it contains a `.` or `:` or is
/// `localhost`; otherwise the image lives on Docker Hub.
pub fn registry_host(image: &str) -> String {
    let image = strip_scheme(image);
    match image.split_once('/') {
        Some((first, _)) if is_host(first) => canonical_host(first),
        _ => DEFAULT_REGISTRY.to_string(),
    }
}

/// Normalise a registry key as found in docker config `auths` maps.
///
/// Keys may carry a scheme and a path (`https://index.docker.io/v1/`); only
/// the host is compared.
pub fn normalize_registry(registry: &str) -> String {
    let registry = strip_scheme(registry);
    let host = registry.split('/').next().unwrap_or(registry);
    canonical_host(host)
}

fn strip_scheme(value: &str) -> &str {
    value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value)
}

fn is_host(component: &str) -> bool {
    component.contains('.') || component.contains(':') || component == "localhost"
}

fn canonical_host(host: &str) -> String {
    match host {
        "index.docker.io" | "registry-1.docker.io" => DEFAULT_REGISTRY.to_string(),
        other => other.to_lowercase(),
    }
}

/// Resolve the `imagePullSecrets` entries for an image.
///
/// Returns `None` when no credentials are configured for the image's
/// registry, so the field can be omitted from the pod template.
pub async fn image_pull_secrets(
    retriever: &dyn SecretRetriever,
    namespace: &str,
    image: &str,
) -> Result<Option<Vec<LocalObjectReference>>> {
    let registry = registry_host(image);
    let names = retriever.get_secrets(namespace, &registry).await?;

    if names.is_empty() {
        debug!(
            namespace = %namespace,
            registry = %registry,
            backend = retriever.backend_name(),
            "No pull secrets configured"
        );
        return Ok(None);
    }

    Ok(Some(
        names
            .into_iter()
            .map(|name| LocalObjectReference { name: Some(name) })
            .collect(),
    ))
}
