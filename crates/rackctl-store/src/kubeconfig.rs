//! Credential store types.
//!
//! The credential store is a standard kubeconfig document, parsed with
//! [`kube::config`]. On disk every collection is a list of `{name, <kind>}`
//! entries; in memory they are keyed maps so that lookups, renames and
//! deletions are direct. Entries keep every field kube understands, including
//! the ones rackctl never edits (`exec`, `proxy-url`, extensions).

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kube::config::{NamedAuthInfo, NamedCluster, NamedContext};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::schema::{defaults, kinds};

pub use kube::config::{
    AuthInfo as KubeAuthInfo, Cluster as KubeCluster, Context as KubeContext, NamedExtension,
    Preferences,
};

/// The credential store document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    try_from = "kube::config::Kubeconfig",
    into = "kube::config::Kubeconfig"
)]
pub struct Kubeconfig {
    /// Document API version.
    pub api_version: String,
    /// Document kind.
    pub kind: String,
    /// Cluster endpoints by name.
    pub clusters: BTreeMap<String, KubeCluster>,
    /// Contexts by name.
    pub contexts: BTreeMap<String, KubeContext>,
    /// Credentials by name. Serialized as `users`.
    pub auth_infos: BTreeMap<String, KubeAuthInfo>,
    /// The selected context, or empty.
    pub current_context: String,
    /// Client preferences, carried through untouched.
    pub preferences: Option<Preferences>,
    /// Document extensions, carried through untouched.
    pub extensions: Option<Vec<NamedExtension>>,
}

impl Kubeconfig {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_version: kinds::KUBECONFIG_API_VERSION.to_string(),
            kind: kinds::KUBECONFIG_KIND.to_string(),
            clusters: BTreeMap::new(),
            contexts: BTreeMap::new(),
            auth_infos: BTreeMap::new(),
            current_context: String::new(),
            preferences: None,
            extensions: None,
        }
    }

    /// The document used when no credential file exists yet.
    ///
    /// It holds one target cluster, one credential and one context joining
    /// them. No context is selected.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut config = Self::new();

        config.clusters.insert(
            defaults::CONTEXT.to_string(),
            KubeCluster {
                server: Some(defaults::CLUSTER_SERVER.to_string()),
                ..KubeCluster::default()
            },
        );
        config.auth_infos.insert(
            defaults::AUTH_INFO.to_string(),
            KubeAuthInfo {
                username: Some(defaults::USERNAME.to_string()),
                ..KubeAuthInfo::default()
            },
        );
        config.contexts.insert(
            defaults::CONTEXT.to_string(),
            KubeContext {
                cluster: defaults::CONTEXT.to_string(),
                user: Some(defaults::AUTH_INFO.to_string()),
                ..KubeContext::default()
            },
        );

        config
    }

    /// Render the document as YAML, or an empty string if encoding fails.
    #[must_use]
    pub fn to_yaml_string(&self) -> String {
        crate::types::render_yaml(self)
    }
}

impl Default for Kubeconfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Documents are equal when they encode to the same YAML tree.
impl PartialEq for Kubeconfig {
    fn eq(&self, other: &Self) -> bool {
        match (serde_yaml::to_value(self), serde_yaml::to_value(other)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// Wrap a plain string as a kubeconfig secret.
#[must_use]
pub fn secret(value: impl Into<String>) -> SecretString {
    SecretString::from(value.into())
}

/// The plain text of an optional secret.
#[must_use]
pub fn exposed(value: Option<&SecretString>) -> Option<&str> {
    value.map(|s| s.expose_secret())
}

/// Encode file contents for a `*-data` field.
#[must_use]
pub fn encode_data(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode the contents of a `*-data` field. Line breaks are ignored.
///
/// # Errors
///
/// Returns the decoder error if the value is not valid base64.
pub fn decode_data(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

/// Return true if any certificate authority setting is present.
#[must_use]
pub fn has_certificate_authority(cluster: &KubeCluster) -> bool {
    cluster.certificate_authority.is_some() || cluster.certificate_authority_data.is_some()
}

fn check_data(entry: &str, field: &str, value: Option<&str>) -> Result<(), String> {
    match value.map(decode_data) {
        Some(Err(e)) => Err(format!("{entry}: invalid base64 in {field}: {e}")),
        _ => Ok(()),
    }
}

impl TryFrom<kube::config::Kubeconfig> for Kubeconfig {
    type Error = String;

    fn try_from(file: kube::config::Kubeconfig) -> Result<Self, Self::Error> {
        let clusters: BTreeMap<String, KubeCluster> = file
            .clusters
            .into_iter()
            .map(|c| (c.name, c.cluster.unwrap_or_default()))
            .collect();
        let auth_infos: BTreeMap<String, KubeAuthInfo> = file
            .auth_infos
            .into_iter()
            .map(|a| (a.name, a.auth_info.unwrap_or_default()))
            .collect();

        for (name, cluster) in &clusters {
            check_data(
                name,
                "certificate-authority-data",
                cluster.certificate_authority_data.as_deref(),
            )?;
        }
        for (name, auth) in &auth_infos {
            check_data(
                name,
                "client-certificate-data",
                auth.client_certificate_data.as_deref(),
            )?;
            check_data(name, "client-key-data", exposed(auth.client_key_data.as_ref()))?;
        }

        Ok(Self {
            api_version: file
                .api_version
                .unwrap_or_else(|| kinds::KUBECONFIG_API_VERSION.to_string()),
            kind: file
                .kind
                .unwrap_or_else(|| kinds::KUBECONFIG_KIND.to_string()),
            clusters,
            contexts: file
                .contexts
                .into_iter()
                .map(|c| (c.name, c.context.unwrap_or_default()))
                .collect(),
            auth_infos,
            current_context: file.current_context.unwrap_or_default(),
            preferences: file.preferences,
            extensions: file.extensions,
        })
    }
}

impl From<Kubeconfig> for kube::config::Kubeconfig {
    fn from(config: Kubeconfig) -> Self {
        Self {
            api_version: Some(config.api_version),
            kind: Some(config.kind),
            clusters: config
                .clusters
                .into_iter()
                .map(|(name, cluster)| NamedCluster {
                    name,
                    cluster: Some(cluster),
                })
                .collect(),
            contexts: config
                .contexts
                .into_iter()
                .map(|(name, context)| NamedContext {
                    name,
                    context: Some(context),
                })
                .collect(),
            auth_infos: config
                .auth_infos
                .into_iter()
                .map(|(name, auth_info)| NamedAuthInfo {
                    name,
                    auth_info: Some(auth_info),
                })
                .collect(),
            current_context: Some(config.current_context).filter(|c| !c.is_empty()),
            preferences: config.preferences,
            extensions: config.extensions,
            ..Self::default()
        }
    }
}
