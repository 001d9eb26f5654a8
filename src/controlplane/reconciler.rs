//! GraphDeployment Reconciler
//!
//! Coordinates one reconciliation pass:
//! - Building and applying the storage claims of a deployment
//! - Resolving registry pull secrets for the deployment image
//! - Publishing the observed state on the status subresource

use crate::controlplane::claims::build_claims;
use crate::controlplane::secrets::image_pull_secrets;
use crate::crd::{GraphDeployment, GraphDeploymentStatus};
use crate::domain::ports::SecretRetrieverRef;
use crate::error::{Error, ErrorAction, Result};
use futures::StreamExt;
use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

// =============================================================================
// Operator Configuration
// =============================================================================

/// Configuration for the reconciler
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Field manager used for server-side apply
    pub field_manager: String,
    /// Requeue interval after a successful pass
    pub requeue_interval: Duration,
    /// Delay before retrying a transient failure
    pub error_backoff: Duration,
    /// Deadline for a single registry secret lookup
    pub lookup_timeout: Duration,
    /// Restrict watches to one namespace
    pub watch_namespace: Option<String>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            field_manager: "graph-deployment-operator".to_string(),
            requeue_interval: Duration::from_secs(300),
            error_backoff: Duration::from_secs(5),
            lookup_timeout: Duration::from_secs(10),
            watch_namespace: None,
        }
    }
}

// =============================================================================
// Context
// =============================================================================

/// Shared state handed to every reconciliation
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Registry credential lookup
    pub retriever: SecretRetrieverRef,
    /// Operator configuration
    pub config: OperatorConfig,
}

impl Context {
    /// Create a new reconciler context
    pub fn new(client: Client, retriever: SecretRetrieverRef, config: OperatorConfig) -> Self {
        Self {
            client,
            retriever,
            config,
        }
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Claims of a deployment, owned by it so they are garbage collected with it
pub fn desired_claims(gd: &GraphDeployment) -> Result<Vec<PersistentVolumeClaim>> {
    let owner_ref = gd
        .controller_owner_ref(&())
        .ok_or(Error::MissingObjectKey(".metadata.uid"))?;

    let mut claims = build_claims(gd, &gd.spec.pvcs)?;
    for claim in &mut claims {
        claim.metadata.owner_references = Some(vec![owner_ref.clone()]);
    }
    Ok(claims)
}

/// Reconcile a single GraphDeployment
#[instrument(skip(gd, ctx), fields(name = %gd.name_any()))]
pub async fn reconcile(gd: Arc<GraphDeployment>, ctx: Arc<Context>) -> Result<Action> {
    let namespace = gd
        .namespace()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
    let name = gd.name_any();

    let claims = desired_claims(&gd)?;
    let pvc_api: Api<PersistentVolumeClaim> = Api::namespaced(ctx.client.clone(), &namespace);
    let params = PatchParams::apply(&ctx.config.field_manager).force();

    let mut applied = Vec::with_capacity(claims.len());
    for claim in claims {
        let claim_name = claim.name_any();
        pvc_api
            .patch(&claim_name, &params, &Patch::Apply(&claim))
            .await?;
        info!(namespace = %namespace, claim = %claim_name, "Applied storage claim");
        applied.push(claim_name);
    }

    let pull_secrets = match gd.spec.image.as_deref() {
        Some(image) => image_pull_secrets(ctx.retriever.as_ref(), &namespace, image)
            .await?
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.name)
            .collect(),
        None => Vec::new(),
    };

    let status = GraphDeploymentStatus {
        observed_generation: gd.metadata.generation,
        claims: applied,
        image_pull_secrets: pull_secrets,
    };
    let gd_api: Api<GraphDeployment> = Api::namespaced(ctx.client.clone(), &namespace);
    gd_api
        .patch_status(
            &name,
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await?;

    debug!(namespace = %namespace, "Reconciliation pass complete");
    Ok(Action::requeue(ctx.config.requeue_interval))
}

/// Map a reconciliation error to the controller action
pub fn error_action(error: &Error, config: &OperatorConfig) -> Action {
    match error.action() {
        ErrorAction::RequeueWithBackoff => Action::requeue(config.error_backoff),
        ErrorAction::RequeueAfter(delay) => Action::requeue(delay),
        ErrorAction::NoRequeue => Action::await_change(),
    }
}

/// Controller error policy
pub fn error_policy(gd: Arc<GraphDeployment>, error: &Error, ctx: Arc<Context>) -> Action {
    if error.is_transient() {
        warn!(name = %gd.name_any(), error = %error, "Reconciliation failed, retrying");
    } else {
        error!(name = %gd.name_any(), error = %error, "Reconciliation failed");
    }
    error_action(error, &ctx.config)
}

// =============================================================================
// Controller
// =============================================================================

/// Run the controller until a shutdown signal is received
pub async fn run(
    client: Client,
    retriever: SecretRetrieverRef,
    config: OperatorConfig,
) -> Result<()> {
    let (deployments, claims): (Api<GraphDeployment>, Api<PersistentVolumeClaim>) =
        match &config.watch_namespace {
            Some(ns) => (
                Api::namespaced(client.clone(), ns),
                Api::namespaced(client.clone(), ns),
            ),
            None => (Api::all(client.clone()), Api::all(client.clone())),
        };

    deployments
        .list(&ListParams::default().limit(1))
        .await
        .map_err(|e| {
            Error::Configuration(format!("GraphDeployment CRD is not installed: {}", e))
        })?;

    info!(
        backend = retriever.backend_name(),
        namespace = config.watch_namespace.as_deref().unwrap_or("*"),
        "Starting GraphDeployment controller"
    );

    let ctx = Arc::new(Context::new(client, retriever, config));
    Controller::new(deployments, watcher::Config::default())
        .owns(claims, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!(object = %obj, "Reconciled"),
                Err(e) => debug!(error = %e, "Controller event failed"),
            }
        })
        .await;

    info!("Controller stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{AccessMode, GraphDeploymentSpec, PvcConfig};
    use assert_matches::assert_matches;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    fn deployment(pvcs: Vec<PvcConfig>) -> GraphDeployment {
        let mut gd = GraphDeployment::new(
            "infer-svc",
            GraphDeploymentSpec {
                image: Some("registry.example.com/team/infer:1.0".into()),
                pvcs,
            },
        );
        gd.metadata.namespace = Some("prod".into());
        gd.metadata.uid = Some("4c1f3a2e-0000-0000-0000-000000000001".into());
        gd
    }

    fn entry(name: Option<&str>) -> PvcConfig {
        PvcConfig {
            name: name.map(str::to_string),
            storage_class: "fast-ssd".into(),
            size: Quantity("20Gi".into()),
            volume_access_mode: AccessMode::ReadWriteOnce,
        }
    }

    #[test]
    fn test_desired_claims_are_owned() {
        let gd = deployment(vec![entry(None), entry(Some("scratch"))]);
        let claims = desired_claims(&gd).unwrap();

        assert_eq!(claims.len(), 2);
        for claim in &claims {
            assert_eq!(claim.metadata.namespace.as_deref(), Some("prod"));
            let owners = claim.metadata.owner_references.as_ref().unwrap();
            assert_eq!(owners.len(), 1);
            assert_eq!(owners[0].kind, "GraphDeployment");
            assert_eq!(owners[0].name, "infer-svc");
            assert_eq!(owners[0].controller, Some(true));
        }
    }

    #[test]
    fn test_desired_claims_requires_uid() {
        let mut gd = deployment(vec![entry(None)]);
        gd.metadata.uid = None;
        assert_matches!(
            desired_claims(&gd),
            Err(Error::MissingObjectKey(".metadata.uid"))
        );
    }

    #[test]
    fn test_desired_claims_rejects_collisions() {
        let gd = deployment(vec![entry(None), entry(None)]);
        assert_matches!(desired_claims(&gd), Err(Error::DuplicateClaimName { .. }));
    }

    #[test]
    fn test_error_action_mapping() {
        let config = OperatorConfig::default();

        let lookup = Error::secret_lookup("prod", "registry.example.com", "unreachable");
        assert_eq!(
            error_action(&lookup, &config),
            Action::requeue(Duration::from_secs(5))
        );

        let collision = Error::DuplicateClaimName {
            owner: "prod/infer-svc".into(),
            name: "infer-svc".into(),
        };
        assert_eq!(error_action(&collision, &config), Action::await_change());

        let parse = Error::DockerConfigParse("bad".into());
        assert_eq!(
            error_action(&parse, &config),
            Action::requeue(Duration::from_secs(5))
        );
    }
}
