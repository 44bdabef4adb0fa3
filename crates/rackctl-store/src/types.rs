//! Profile store types.
//!
//! These types are the operator-facing declarative configuration: which
//! clusters exist and what role they play, which manifests deploy them and
//! which bootstrap and management records they use. Connection endpoints and
//! credentials live in the [`Kubeconfig`](crate::Kubeconfig) instead; the two
//! are joined by canonical cluster name.

use std::collections::BTreeMap;

use rackctl_core::{ClusterIdentity, ClusterType};
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::schema::{auth_types, defaults, kinds};

/// The profile store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Document API version.
    #[serde(default = "Profile::default_api_version")]
    pub api_version: String,
    /// Document kind.
    #[serde(default = "Profile::default_kind")]
    pub kind: String,
    /// Clusters by name, then by type.
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterGroup>,
    /// Contexts by name. Names match credential-store context names.
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextProfile>,
    /// Credential references by name. Names match credential-store user names.
    #[serde(default)]
    pub auth_infos: BTreeMap<String, AuthInfoProfile>,
    /// Document sources by name.
    #[serde(default)]
    pub manifests: BTreeMap<String, Manifest>,
    /// The selected context, or empty.
    #[serde(default)]
    pub current_context: String,
    /// Bootstrap and management records referenced by clusters.
    #[serde(default)]
    pub modules: Modules,
}

impl Profile {
    fn default_api_version() -> String {
        kinds::PROFILE_API_VERSION.to_string()
    }

    fn default_kind() -> String {
        kinds::PROFILE_KIND.to_string()
    }

    /// Look up the profile entry for a cluster identity.
    #[must_use]
    pub fn cluster(&self, id: &ClusterIdentity) -> Option<&ClusterProfile> {
        self.clusters
            .get(id.name())
            .and_then(|group| group.types.get(&id.cluster_type()))
    }

    /// Look up the profile entry for a cluster identity, mutably.
    pub fn cluster_mut(&mut self, id: &ClusterIdentity) -> Option<&mut ClusterProfile> {
        self.clusters
            .get_mut(id.name())
            .and_then(|group| group.types.get_mut(&id.cluster_type()))
    }

    /// Render the document as YAML, or an empty string if encoding fails.
    #[must_use]
    pub fn to_yaml_string(&self) -> String {
        render_yaml(self)
    }
}

impl Default for Profile {
    /// The profile used when no profile file exists yet.
    fn default() -> Self {
        let mut manifests = BTreeMap::new();
        manifests.insert(defaults::MANIFEST.to_string(), Manifest::default());

        Self {
            api_version: Self::default_api_version(),
            kind: Self::default_kind(),
            clusters: BTreeMap::new(),
            contexts: BTreeMap::new(),
            auth_infos: BTreeMap::new(),
            manifests,
            current_context: String::new(),
            modules: Modules::with_defaults(),
        }
    }
}

/// Every type-variant of one named cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGroup {
    /// Per-type entries.
    #[serde(rename = "clusterType", default)]
    pub types: BTreeMap<ClusterType, ClusterProfile>,
}

/// Profile entry for one `{name, type}` cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    /// Canonical credential-store cluster name.
    #[serde(rename = "clusterKubeconf", default)]
    pub name_in_kubeconf: String,
    /// Name of a record in [`Modules::bootstrap_info`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bootstrap_info: String,
    /// Name of a record in [`Modules::management_configuration`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub management_configuration: String,
}

impl ClusterProfile {
    /// Decode the identity from the stored canonical name.
    #[must_use]
    pub fn identity(&self) -> ClusterIdentity {
        ClusterIdentity::canonicalize(&self.name_in_kubeconf)
    }
}

/// Profile entry for one context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextProfile {
    /// Canonical name of the cluster this context points at.
    #[serde(rename = "contextKubeconf", default)]
    pub name_in_kubeconf: String,
    /// Name of a [`Manifest`].
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub manifest: String,
}

impl ContextProfile {
    /// The type of the cluster this context points at.
    #[must_use]
    pub fn cluster_type(&self) -> ClusterType {
        ClusterIdentity::canonicalize(&self.name_in_kubeconf).cluster_type()
    }
}

/// Profile entry for one credential. All data lives in the credential store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfoProfile {}

/// A named pointer to the document source a site is deployed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Name of the repository holding the site documents.
    #[serde(default)]
    pub primary_repository_name: String,
    /// Repositories by name.
    #[serde(default)]
    pub repositories: BTreeMap<String, Repository>,
    /// Local checkout root.
    #[serde(default)]
    pub target_path: String,
    /// Path of the site inside the checkout.
    #[serde(default)]
    pub sub_path: String,
}

impl Manifest {
    /// Return the primary repository, if it is defined.
    #[must_use]
    pub fn primary_repository(&self) -> Option<&Repository> {
        self.repositories.get(&self.primary_repository_name)
    }

    /// Validate every repository of the manifest.
    ///
    /// # Errors
    ///
    /// Returns the name of the first invalid repository with its error.
    pub fn validate(&self) -> Result<(), (String, RepositoryError)> {
        for (name, repo) in &self.repositories {
            repo.validate().map_err(|e| (name.clone(), e))?;
        }
        Ok(())
    }
}

impl Default for Manifest {
    fn default() -> Self {
        let mut repositories = BTreeMap::new();
        repositories.insert(defaults::REPOSITORY.to_string(), Repository::default());

        Self {
            primary_repository_name: defaults::REPOSITORY.to_string(),
            repositories,
            target_path: defaults::TARGET_PATH.to_string(),
            sub_path: String::new(),
        }
    }
}

/// A source repository of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Clone URL.
    #[serde(default)]
    pub url: String,
    /// Authentication options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<RepoAuth>,
    /// Checkout options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout: Option<RepoCheckout>,
}

impl Default for Repository {
    fn default() -> Self {
        Self {
            url: "https://opendev.org/airship/treasuremap".to_string(),
            auth: None,
            checkout: Some(RepoCheckout {
                branch: Some("master".to_string()),
                ..RepoCheckout::default()
            }),
        }
    }
}

impl Repository {
    /// Check the structural constraints of the repository.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` when the URL is missing, the auth options are
    /// inconsistent with the auth type, or more than one checkout target is set.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if self.url.is_empty() {
            return Err(RepositoryError::RequiresUrl);
        }
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        if let Some(checkout) = &self.checkout {
            checkout.validate()?;
        }
        Ok(())
    }
}

/// Repository authentication options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoAuth {
    /// One of [`auth_types::ALL`].
    #[serde(rename = "type")]
    pub auth_type: String,
    /// Private key path, for `ssh-key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    /// Private key passphrase, for `ssh-key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_password: Option<String>,
    /// SSH password, for `ssh-pass`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    /// HTTP password, for `http-basic`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_password: Option<String>,
    /// Username, for any type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

fn is_set(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

impl RepoAuth {
    /// Check that only the options of the declared type are set.
    ///
    /// # Errors
    ///
    /// Returns `AuthTypeNotSupported` or `IncompatibleAuthOptions`.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        let forbidden: Vec<(&str, Option<&String>)> = match self.auth_type.as_str() {
            auth_types::SSH_KEY => vec![
                ("http-pass", self.http_password.as_ref()),
                ("ssh-pass", self.ssh_password.as_ref()),
            ],
            auth_types::SSH_PASS => vec![
                ("ssh-key", self.key_path.as_ref()),
                ("key-pass", self.key_password.as_ref()),
                ("http-pass", self.http_password.as_ref()),
            ],
            auth_types::HTTP_BASIC => vec![
                ("ssh-pass", self.ssh_password.as_ref()),
                ("ssh-key", self.key_path.as_ref()),
                ("key-pass", self.key_password.as_ref()),
            ],
            other => {
                return Err(RepositoryError::AuthTypeNotSupported {
                    auth_type: other.to_string(),
                })
            }
        };

        let set: Vec<String> = forbidden
            .iter()
            .filter(|(_, value)| is_set(*value))
            .map(|(name, _)| (*name).to_string())
            .collect();
        if set.is_empty() {
            Ok(())
        } else {
            Err(RepositoryError::IncompatibleAuthOptions {
                forbidden: set,
                auth_type: self.auth_type.clone(),
            })
        }
    }
}

/// Repository checkout options. At most one target may be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCheckout {
    /// Exact commit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    /// Branch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Tag name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Discard local changes on checkout.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force: bool,
}

impl RepoCheckout {
    /// Check that at most one of commit hash, branch and tag is set.
    ///
    /// # Errors
    ///
    /// Returns `MutuallyExclusiveCheckout` when more than one is set.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        let targets = [
            self.commit_hash.as_ref(),
            self.branch.as_ref(),
            self.tag.as_ref(),
        ];
        if targets.into_iter().filter(|t| is_set(*t)).count() > 1 {
            return Err(RepositoryError::MutuallyExclusiveCheckout);
        }
        Ok(())
    }
}

/// Named bootstrap and management records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Modules {
    /// Bootstrap records by name.
    #[serde(default)]
    pub bootstrap_info: BTreeMap<String, Bootstrap>,
    /// Out-of-band management records by name.
    #[serde(default)]
    pub management_configuration: BTreeMap<String, ManagementConfiguration>,
}

impl Modules {
    /// The records used when no profile file exists yet.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut bootstrap_info = BTreeMap::new();
        bootstrap_info.insert(defaults::BOOTSTRAP_INFO.to_string(), Bootstrap::default());

        let mut management_configuration = BTreeMap::new();
        management_configuration.insert(
            defaults::MANAGEMENT_CONFIGURATION.to_string(),
            ManagementConfiguration::default(),
        );

        Self {
            bootstrap_info,
            management_configuration,
        }
    }
}

/// How to build and boot the ephemeral node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootstrap {
    /// Image builder container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    /// Builder input and output file names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<Builder>,
    /// Virtual media boot options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_direct: Option<RemoteDirect>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            container: Some(Container {
                volume: "/tmp:/config".to_string(),
                image: "quay.io/airshipit/isogen:latest".to_string(),
                container_runtime: "docker".to_string(),
            }),
            builder: Some(Builder {
                user_data_file_name: "user-data".to_string(),
                network_config_file_name: "network-config".to_string(),
                output_metadata_file_name: "output-metadata.yaml".to_string(),
            }),
            remote_direct: Some(RemoteDirect {
                iso_url: "http://localhost:8099/debian-custom.iso".to_string(),
            }),
        }
    }
}

/// Image builder container options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Host-to-container volume mapping.
    #[serde(default)]
    pub volume: String,
    /// Builder image reference.
    #[serde(default)]
    pub image: String,
    /// Container runtime to run the image with.
    #[serde(default)]
    pub container_runtime: String,
}

/// Image builder file names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Builder {
    /// Cloud-init user data.
    #[serde(default)]
    pub user_data_file_name: String,
    /// Cloud-init network config.
    #[serde(default)]
    pub network_config_file_name: String,
    /// Metadata written by the builder.
    #[serde(default)]
    pub output_metadata_file_name: String,
}

/// Virtual media boot options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDirect {
    /// Location of the bootable ISO.
    #[serde(default)]
    pub iso_url: String,
}

/// Out-of-band management options for a cluster's hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementConfiguration {
    /// Client type, e.g. `redfish` or `redfish-dell`.
    #[serde(rename = "type")]
    pub management_type: String,
    /// Skip TLS verification of the BMC endpoint.
    #[serde(default)]
    pub insecure: bool,
    /// Honor proxy environment variables.
    #[serde(default)]
    pub use_proxy: bool,
}

impl Default for ManagementConfiguration {
    fn default() -> Self {
        Self {
            management_type: defaults::MANAGEMENT_TYPE.to_string(),
            insecure: true,
            use_proxy: false,
        }
    }
}

/// Render any document as YAML, or an empty string if encoding fails.
#[must_use]
pub fn render_yaml<T: Serialize + ?Sized>(value: &T) -> String {
    serde_yaml::to_string(value).unwrap_or_default()
}
