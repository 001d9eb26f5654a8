//! Cluster-backed credential lookup
//!
//! Reads `kubernetes.io/dockerconfigjson` secrets from the workload's
//! namespace and selects those whose `auths` map covers the registry.

use super::normalize_registry;
use crate::domain::ports::SecretRetriever;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Secret type holding docker registry credentials
pub const DOCKER_CONFIG_JSON_TYPE: &str = "kubernetes.io/dockerconfigjson";

/// Data key of the docker config payload
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

#[derive(Debug, Deserialize)]
struct DockerConfigJson {
    #[serde(default)]
    auths: BTreeMap<String, serde_json::Value>,
}

/// Registries (normalised) that a docker config payload has credentials for
pub fn docker_config_registries(payload: &[u8]) -> Result<Vec<String>> {
    let config: DockerConfigJson = serde_json::from_slice(payload)
        .map_err(|e| Error::DockerConfigParse(e.to_string()))?;

    let mut registries: Vec<String> = config
        .auths
        .keys()
        .map(|k| normalize_registry(k.as_str()))
        .collect();
    registries.sort();
    registries.dedup();
    Ok(registries)
}

/// Check whether a dockerconfigjson secret carries credentials for a registry
pub fn secret_matches_registry(secret: &Secret, registry: &str) -> Result<bool> {
    if secret.type_.as_deref() != Some(DOCKER_CONFIG_JSON_TYPE) {
        return Ok(false);
    }

    let payload = secret
        .data
        .as_ref()
        .and_then(|data| data.get(DOCKER_CONFIG_JSON_KEY))
        .ok_or_else(|| {
            Error::DockerConfigParse(format!(
                "secret {} has no {} key",
                secret.name_any(),
                DOCKER_CONFIG_JSON_KEY
            ))
        })?;

    let wanted = normalize_registry(registry);
    Ok(docker_config_registries(&payload.0)?
        .iter()
        .any(|r| *r == wanted))
}

/// Names of the secrets holding credentials for a registry, sorted by name.
///
/// Secrets whose payload cannot be parsed are logged and skipped.
pub fn matching_secret_names(secrets: &[Secret], registry: &str) -> Vec<String> {
    let mut names = Vec::new();
    for secret in secrets {
        match secret_matches_registry(secret, registry) {
            Ok(true) => names.push(secret.name_any()),
            Ok(false) => {}
            Err(e) => warn!(
                namespace = ?secret.namespace(),
                secret = %secret.name_any(),
                error = %e,
                "Skipping malformed pull secret"
            ),
        }
    }
    names.sort();
    names
}

/// [`SecretRetriever`] backed by namespace secrets in the cluster
pub struct KubeSecretRetriever {
    client: Client,
}

impl KubeSecretRetriever {
    /// Create a new cluster-backed retriever
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretRetriever for KubeSecretRetriever {
    async fn get_secrets(&self, namespace: &str, registry: &str) -> Result<Vec<String>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let params = ListParams::default().fields(&format!("type={}", DOCKER_CONFIG_JSON_TYPE));

        let secrets = api
            .list(&params)
            .await
            .map_err(|e| Error::secret_lookup(namespace, registry, e.to_string()))?;

        let names = matching_secret_names(&secrets.items, registry);

        debug!(
            namespace = %namespace,
            registry = %registry,
            count = names.len(),
            "Resolved registry secrets"
        );
        Ok(names)
    }

    fn backend_name(&self) -> &str {
        "kubernetes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::ByteString;

    fn docker_secret(name: &str, payload: &str) -> Secret {
        let mut data = BTreeMap::new();
        data.insert(
            DOCKER_CONFIG_JSON_KEY.to_string(),
            ByteString(payload.as_bytes().to_vec()),
        );
        Secret {
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace: Some("team-x".into()),
                ..Default::default()
            },
            type_: Some(DOCKER_CONFIG_JSON_TYPE.into()),
            data: Some(data),
            ..Default::default()
        }
    }

    #[test]
    fn test_docker_config_registries() {
        let payload = br#"{
            "auths": {
                "https://index.docker.io/v1/": {"auth": "eA=="},
                "registry.example.com": {"auth": "eQ=="}
            }
        }"#;
        let registries = docker_config_registries(payload).unwrap();
        assert_eq!(registries, vec!["docker.io", "registry.example.com"]);
    }

    #[test]
    fn test_docker_config_without_auths() {
        assert!(docker_config_registries(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_docker_config_invalid_json() {
        let err = docker_config_registries(b"not json").unwrap_err();
        assert_matches!(err, Error::DockerConfigParse(_));
    }

    #[test]
    fn test_secret_matches_registry() {
        let secret = docker_secret(
            "docker-cred-1",
            r#"{"auths":{"registry.example.com":{"auth":"eA=="}}}"#,
        );
        assert!(secret_matches_registry(&secret, "registry.example.com").unwrap());
        assert!(!secret_matches_registry(&secret, "other.example.com").unwrap());
    }

    #[test]
    fn test_other_secret_types_never_match() {
        let mut secret = docker_secret("opaque", r#"{"auths":{"registry.example.com":{}}}"#);
        secret.type_ = Some("Opaque".into());
        assert!(!secret_matches_registry(&secret, "registry.example.com").unwrap());
    }

    #[test]
    fn test_matching_secret_names_sorted_and_skips_malformed() {
        let wanted = r#"{"auths":{"registry.example.com":{"auth":"eA=="}}}"#;
        let secrets = vec![
            docker_secret("docker-cred-2", wanted),
            docker_secret("broken", "{not json"),
            docker_secret(
                "other-registry",
                r#"{"auths":{"other.example.com":{"auth":"eA=="}}}"#,
            ),
            docker_secret("docker-cred-1", wanted),
        ];

        let names = matching_secret_names(&secrets, "registry.example.com");
        assert_eq!(names, vec!["docker-cred-1", "docker-cred-2"]);

        let mut reversed = secrets.clone();
        reversed.reverse();
        assert_eq!(
            matching_secret_names(&reversed, "registry.example.com"),
            names
        );
    }

    #[test]
    fn test_matching_secret_names_empty_for_unknown_registry() {
        let secrets = vec![docker_secret(
            "docker-cred-1",
            r#"{"auths":{"registry.example.com":{"auth":"eA=="}}}"#,
        )];
        assert!(matching_secret_names(&secrets, "other.example.com").is_empty());
    }

    #[test]
    fn test_secret_without_payload() {
        let mut secret = docker_secret("empty", "{}");
        secret.data = None;
        let err = secret_matches_registry(&secret, "registry.example.com").unwrap_err();
        assert_matches!(err, Error::DockerConfigParse(_));
    }
}
