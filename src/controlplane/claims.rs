//! Storage Claim Construction
//!
//! Maps GraphDeployment storage entries onto PersistentVolumeClaim objects.
//! Construction is pure: the same owner and entry always produce the same
//! claim, so the reconciler can re-apply it on every pass without churn.

use crate::crd::PvcConfig;
use crate::domain::ports::OwnerIdentity;
use crate::error::{Error, Result};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Resource key used for the capacity request
pub const STORAGE_RESOURCE: &str = "storage";

// =============================================================================
// Name Resolution
// =============================================================================

/// Resolve the claim name for an owner.
///
/// A non-empty override wins; otherwise the claim takes the owner's name.
/// Entries without an override on the same owner therefore share a name.
pub fn resolve_claim_name<O: OwnerIdentity + ?Sized>(
    owner: &O,
    name_override: Option<&str>,
) -> String {
    match name_override {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => owner.owner_name(),
    }
}

// =============================================================================
// Claim Builder
// =============================================================================

/// Build the claim for a single storage entry
pub fn build_claim<O: OwnerIdentity + ?Sized>(
    owner: &O,
    config: &PvcConfig,
) -> PersistentVolumeClaim {
    let name = resolve_claim_name(owner, config.name.as_deref());
    debug!(
        claim = %name,
        storage_class = %config.storage_class,
        size = %config.size.0,
        access_mode = %config.volume_access_mode,
        "Building storage claim"
    );

    let mut requests = BTreeMap::new();
    requests.insert(STORAGE_RESOURCE.to_string(), config.size.clone());

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: owner.owner_namespace(),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![config.volume_access_mode.as_str().to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                ..Default::default()
            }),
            // Always pinned, never left to the cluster default class
            storage_class_name: Some(config.storage_class.clone()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Build the claims for every storage entry of an owner.
///
/// Fails with [`Error::DuplicateClaimName`] when two entries resolve to the
/// same name, since applying both would make one silently overwrite the other.
pub fn build_claims<O: OwnerIdentity + ?Sized>(
    owner: &O,
    configs: &[PvcConfig],
) -> Result<Vec<PersistentVolumeClaim>> {
    let mut seen = BTreeSet::new();
    for config in configs {
        let name = resolve_claim_name(owner, config.name.as_deref());
        if !seen.insert(name.clone()) {
            let owner_ref = match owner.owner_namespace() {
                Some(ns) => format!("{}/{}", ns, owner.owner_name()),
                None => owner.owner_name(),
            };
            return Err(Error::DuplicateClaimName {
                owner: owner_ref,
                name,
            });
        }
    }

    Ok(configs.iter().map(|config| build_claim(owner, config)).collect())
}
