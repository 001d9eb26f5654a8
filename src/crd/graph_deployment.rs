//! GraphDeployment CRD
//!
//! Declares a workload's container image and the persistent storage it
//! needs. The operator turns every storage entry into a concrete
//! PersistentVolumeClaim in the deployment's namespace.

use crate::domain::ports::OwnerIdentity;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// GraphDeployment CRD
// =============================================================================

/// GraphDeployment describes a workload together with the storage claims
/// and registry access it requires.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "graph.deploy.io",
    version = "v1alpha1",
    kind = "GraphDeployment",
    plural = "graphdeployments",
    shortname = "gd",
    status = "GraphDeploymentStatus",
    printcolumn = r#"{"name": "Image", "type": "string", "jsonPath": ".spec.image"}"#,
    printcolumn = r#"{"name": "Claims", "type": "string", "jsonPath": ".status.claims"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct GraphDeploymentSpec {
    /// Container image of the workload; its registry selects pull secrets
    #[serde(default)]
    pub image: Option<String>,

    /// Persistent volume claims to create for the workload
    #[serde(default)]
    pub pvcs: Vec<PvcConfig>,
}

// =============================================================================
// Sub-Types
// =============================================================================

/// One storage entry of a GraphDeployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PvcConfig {
    /// Claim name; defaults to the GraphDeployment's name
    #[serde(default)]
    pub name: Option<String>,

    /// Storage class to bind against
    pub storage_class: String,

    /// Requested capacity (e.g., "10Gi")
    pub size: Quantity,

    /// Access mode of the claim
    #[serde(default)]
    pub volume_access_mode: AccessMode,
}

/// Persistent volume access mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AccessMode {
    #[default]
    ReadWriteOnce,
    ReadOnlyMany,
    ReadWriteMany,
    ReadWriteOncePod,
}

impl AccessMode {
    /// Kubernetes wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::ReadWriteOnce => "ReadWriteOnce",
            AccessMode::ReadOnlyMany => "ReadOnlyMany",
            AccessMode::ReadWriteMany => "ReadWriteMany",
            AccessMode::ReadWriteOncePod => "ReadWriteOncePod",
        }
    }
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of a GraphDeployment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphDeploymentStatus {
    /// Generation the status was computed from
    #[serde(default)]
    pub observed_generation: Option<i64>,

    /// Names of the applied claims
    #[serde(default)]
    pub claims: Vec<String>,

    /// Pull secrets discovered for the image registry
    #[serde(default)]
    pub image_pull_secrets: Vec<String>,
}

// =============================================================================
// Implementations
// =============================================================================

impl OwnerIdentity for GraphDeployment {
    fn owner_name(&self) -> String {
        self.name_any()
    }

    fn owner_namespace(&self) -> Option<String> {
        self.namespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_display() {
        assert_eq!(format!("{}", AccessMode::ReadWriteOnce), "ReadWriteOnce");
        assert_eq!(format!("{}", AccessMode::ReadOnlyMany), "ReadOnlyMany");
        assert_eq!(format!("{}", AccessMode::ReadWriteMany), "ReadWriteMany");
    }

    #[test]
    fn test_spec_from_json() {
        let spec: GraphDeploymentSpec = serde_json::from_value(serde_json::json!({
            "image": "registry.example.com/team/infer:1.0",
            "pvcs": [
                {
                    "name": "model-cache",
                    "storageClass": "fast-ssd",
                    "size": "20Gi",
                    "volumeAccessMode": "ReadWriteMany"
                },
                {
                    "storageClass": "standard",
                    "size": "1Gi"
                }
            ]
        }))
        .unwrap();

        assert_eq!(spec.pvcs.len(), 2);
        assert_eq!(spec.pvcs[0].name.as_deref(), Some("model-cache"));
        assert_eq!(spec.pvcs[0].size, Quantity("20Gi".into()));
        assert_eq!(spec.pvcs[0].volume_access_mode, AccessMode::ReadWriteMany);
        assert_eq!(spec.pvcs[1].name, None);
        assert_eq!(spec.pvcs[1].volume_access_mode, AccessMode::ReadWriteOnce);
    }

    #[test]
    fn test_owner_identity() {
        let mut gd = GraphDeployment::new("infer-svc", GraphDeploymentSpec::default());
        gd.metadata.namespace = Some("prod".into());

        assert_eq!(gd.owner_name(), "infer-svc");
        assert_eq!(gd.owner_namespace().as_deref(), Some("prod"));
    }
}
