//! Accessor/mutator operations on a [`Config`].
//!
//! Every operation validates its options and reads any referenced file before
//! touching either store, so a failed call leaves the handle unchanged.
//! Modify calls apply only the fields that are set and non-empty.

use std::fs;
use std::path::{Path, PathBuf};

use rackctl_core::ClusterIdentity;
use rackctl_store::kubeconfig::{encode_data, secret};
use rackctl_store::{
    AuthInfoProfile, ClusterProfile, ContextProfile, KubeAuthInfo, KubeCluster, KubeContext,
};

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::types::{non_empty, AuthInfoOptions, ClusterOptions, ContextOptions};

/// A file-backed credential field: a stored path or embedded bytes.
#[derive(Debug)]
enum FileValue {
    Path(String),
    Data(Vec<u8>),
}

impl FileValue {
    fn prepare(path: &Path, embed: bool) -> Result<Self> {
        if embed {
            fs::read(path).map(Self::Data).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        } else {
            Ok(Self::Path(absolute(path)?.display().to_string()))
        }
    }

    /// The `(path, base64 data)` pair to store. Exactly one side is set.
    fn into_fields(self) -> (Option<String>, Option<String>) {
        match self {
            Self::Path(p) => (Some(p), None),
            Self::Data(d) => (None, Some(encode_data(&d))),
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn apply_cluster(cluster: &mut KubeCluster, options: &ClusterOptions, ca: Option<FileValue>) {
    if let Some(server) = non_empty(options.server.as_ref()) {
        cluster.server = Some(server.to_string());
    }

    // The three trust modes are exclusive; the last one given wins
    if options.insecure_skip_tls_verify {
        cluster.insecure_skip_tls_verify = Some(true);
        cluster.certificate_authority = None;
        cluster.certificate_authority_data = None;
    }
    if let Some(ca) = ca {
        cluster.insecure_skip_tls_verify = None;
        (cluster.certificate_authority, cluster.certificate_authority_data) = ca.into_fields();
    }
}

fn apply_cluster_profile(profile: &mut ClusterProfile, options: &ClusterOptions) {
    if let Some(name) = non_empty(options.bootstrap_info.as_ref()) {
        profile.bootstrap_info = name.to_string();
    }
    if let Some(name) = non_empty(options.management_configuration.as_ref()) {
        profile.management_configuration = name.to_string();
    }
}

fn apply_auth_info(
    auth: &mut KubeAuthInfo,
    options: &AuthInfoOptions,
    cert: Option<FileValue>,
    key: Option<FileValue>,
) {
    if let Some(cert) = cert {
        (auth.client_certificate, auth.client_certificate_data) = cert.into_fields();
    }
    if let Some(key) = key {
        let (path, data) = key.into_fields();
        auth.client_key = path;
        auth.client_key_data = data.map(secret);
    }
    if let Some(token) = non_empty(options.token.as_ref()) {
        auth.token = Some(secret(token));
    }
    if let Some(username) = non_empty(options.username.as_ref()) {
        auth.username = Some(username.to_string());
    }
    if let Some(password) = non_empty(options.password.as_ref()) {
        auth.password = Some(secret(password));
    }
}

impl Config {
    // =========================================================================
    // Clusters
    // =========================================================================

    fn prepare_ca(options: &ClusterOptions) -> Result<Option<FileValue>> {
        options
            .certificate_authority
            .as_deref()
            .map(|path| FileValue::prepare(path, options.embed_ca_data))
            .transpose()
    }

    /// Create a cluster in both stores, then apply the options to it.
    ///
    /// An existing profile entry for the same identity is replaced.
    ///
    /// # Errors
    ///
    /// Returns the validation error, an `Io` error if the CA file cannot be
    /// read, or `InvalidState` before reconciliation.
    pub fn add_cluster(&mut self, options: &ClusterOptions) -> Result<ClusterIdentity> {
        options.validate()?;
        let id = options.identity()?;
        let ca = Self::prepare_ca(options)?;
        self.touch()?;

        let canonical = id.to_string();
        let mut profile = ClusterProfile {
            name_in_kubeconf: canonical.clone(),
            ..ClusterProfile::default()
        };
        apply_cluster_profile(&mut profile, options);
        self.profile
            .clusters
            .entry(id.name().to_string())
            .or_default()
            .types
            .insert(id.cluster_type(), profile);
        let cluster = self.kubeconfig.clusters.entry(canonical).or_default();
        *cluster = KubeCluster::default();
        apply_cluster(cluster, options, ca);

        tracing::info!(cluster = %id, "Added cluster");
        Ok(id)
    }

    /// Apply the options to an existing cluster.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if the cluster does not exist, otherwise
    /// as [`Config::add_cluster`].
    pub fn modify_cluster(&mut self, options: &ClusterOptions) -> Result<ClusterIdentity> {
        options.validate()?;
        let id = options.identity()?;
        let Some(key) = self
            .profile
            .cluster(&id)
            .map(|c| c.name_in_kubeconf.clone())
        else {
            return Err(ConfigError::missing(format!(
                "Cluster with name '{}' of type '{}'",
                id.name(),
                id.cluster_type()
            )));
        };
        let ca = Self::prepare_ca(options)?;
        self.touch()?;

        if let Some(profile) = self.profile.cluster_mut(&id) {
            apply_cluster_profile(profile, options);
        }
        let cluster = self.kubeconfig.clusters.entry(key).or_default();
        apply_cluster(cluster, options, ca);

        tracing::info!(cluster = %id, "Modified cluster");
        Ok(id)
    }

    /// Modify the cluster if it exists, add it otherwise.
    ///
    /// Returns true if the cluster was created.
    ///
    /// # Errors
    ///
    /// As [`Config::add_cluster`] and [`Config::modify_cluster`].
    pub fn set_cluster(&mut self, options: &ClusterOptions) -> Result<bool> {
        let id = options.identity()?;
        if self.profile.cluster(&id).is_some() {
            self.modify_cluster(options)?;
            Ok(false)
        } else {
            self.add_cluster(options)?;
            Ok(true)
        }
    }

    // =========================================================================
    // Contexts
    // =========================================================================

    /// The context name the options address.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if `current` is requested but no current
    /// context is set.
    pub fn resolve_context_name(&self, options: &ContextOptions) -> Result<String> {
        if options.current {
            if self.profile.current_context.is_empty() {
                return Err(ConfigError::missing(
                    "Current context must be set before using the current flag",
                ));
            }
            return Ok(self.profile.current_context.clone());
        }
        non_empty(options.name.as_ref())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::invalid("you must specify a non-empty context name"))
    }

    fn apply_context(&mut self, name: &str, options: &ContextOptions, reference: Option<String>) {
        let context = self.kubeconfig.contexts.entry(name.to_string()).or_default();
        let profile = self.profile.contexts.entry(name.to_string()).or_default();

        if let Some(reference) = reference {
            profile.name_in_kubeconf.clone_from(&reference);
            context.cluster = reference;
        }
        if let Some(auth_info) = non_empty(options.auth_info.as_ref()) {
            context.user = Some(auth_info.to_string());
        }
        if let Some(manifest) = non_empty(options.manifest.as_ref()) {
            profile.manifest = manifest.to_string();
        }
        if let Some(namespace) = non_empty(options.namespace.as_ref()) {
            context.namespace = Some(namespace.to_string());
        }
    }

    /// Create a context in both stores, then apply the options to it.
    ///
    /// # Errors
    ///
    /// Returns the validation error or `InvalidState` before reconciliation.
    pub fn add_context(&mut self, options: &ContextOptions) -> Result<String> {
        options.validate()?;
        let name = self.resolve_context_name(options)?;
        let reference = options.cluster_reference()?;
        self.touch()?;

        self.profile
            .contexts
            .insert(name.clone(), ContextProfile::default());
        self.kubeconfig
            .contexts
            .insert(name.clone(), KubeContext::default());
        self.apply_context(&name, options, reference);

        tracing::info!(context = %name, "Added context");
        Ok(name)
    }

    /// Apply the options to an existing context.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if the context does not exist, otherwise
    /// as [`Config::add_context`].
    pub fn modify_context(&mut self, options: &ContextOptions) -> Result<String> {
        options.validate()?;
        let name = self.resolve_context_name(options)?;
        if !self.profile.contexts.contains_key(&name) {
            return Err(ConfigError::missing(format!("Context with name '{name}'")));
        }
        let reference = options.cluster_reference()?;
        self.touch()?;

        self.apply_context(&name, options, reference);

        tracing::info!(context = %name, "Modified context");
        Ok(name)
    }

    /// Modify the context if it exists, add it otherwise.
    ///
    /// Returns true if the context was created.
    ///
    /// # Errors
    ///
    /// As [`Config::add_context`] and [`Config::modify_context`].
    pub fn set_context(&mut self, options: &ContextOptions) -> Result<bool> {
        options.validate()?;
        let name = self.resolve_context_name(options)?;
        if self.profile.contexts.contains_key(&name) {
            self.modify_context(options)?;
            Ok(false)
        } else {
            self.add_context(options)?;
            Ok(true)
        }
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    fn prepare_certs(options: &AuthInfoOptions) -> Result<(Option<FileValue>, Option<FileValue>)> {
        let embed = options.embed_cert_data;
        let cert = options
            .client_certificate
            .as_deref()
            .map(|p| FileValue::prepare(p, embed))
            .transpose()?;
        let key = options
            .client_key
            .as_deref()
            .map(|p| FileValue::prepare(p, embed))
            .transpose()?;
        Ok((cert, key))
    }

    /// Create a credential in both stores, then apply the options to it.
    ///
    /// # Errors
    ///
    /// Returns the validation error, an `Io` error if an embedded file cannot
    /// be read, or `InvalidState` before reconciliation.
    pub fn add_auth_info(&mut self, options: &AuthInfoOptions) -> Result<String> {
        options.validate()?;
        let (cert, key) = Self::prepare_certs(options)?;
        self.touch()?;

        let name = options.name.clone();
        self.profile.auth_infos.insert(name.clone(), AuthInfoProfile {});
        let auth = self.kubeconfig.auth_infos.entry(name.clone()).or_default();
        *auth = KubeAuthInfo::default();
        apply_auth_info(auth, options, cert, key);

        tracing::info!(auth_info = %name, "Added credential");
        Ok(name)
    }

    /// Apply the options to an existing credential.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if the credential does not exist,
    /// otherwise as [`Config::add_auth_info`].
    pub fn modify_auth_info(&mut self, options: &AuthInfoOptions) -> Result<String> {
        options.validate()?;
        let name = options.name.clone();
        if !self.profile.auth_infos.contains_key(&name) {
            return Err(ConfigError::missing(format!(
                "User credentials with name '{name}'"
            )));
        }
        let (cert, key) = Self::prepare_certs(options)?;
        self.touch()?;

        let auth = self.kubeconfig.auth_infos.entry(name.clone()).or_default();
        apply_auth_info(auth, options, cert, key);

        tracing::info!(auth_info = %name, "Modified credential");
        Ok(name)
    }

    /// Modify the credential if it exists, add it otherwise.
    ///
    /// Returns true if the credential was created.
    ///
    /// # Errors
    ///
    /// As [`Config::add_auth_info`] and [`Config::modify_auth_info`].
    pub fn set_auth_info(&mut self, options: &AuthInfoOptions) -> Result<bool> {
        if self.profile.auth_infos.contains_key(&options.name) {
            self.modify_auth_info(options)?;
            Ok(false)
        } else {
            self.add_auth_info(options)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::ConfigState;
    use rackctl_core::ClusterType;
    use rackctl_store::kubeconfig::{decode_data, exposed, has_certificate_authority};
    use rackctl_store::{Kubeconfig, Profile};
    use tempfile::TempDir;

    fn setup() -> Config {
        let mut config = Config::from_documents(Profile::default(), Kubeconfig::with_defaults());
        config.reconcile().unwrap();
        config
    }

    fn kube_cluster<'a>(config: &'a Config, key: &str) -> &'a KubeCluster {
        &config.kubeconfig().clusters[key]
    }

    #[test]
    fn add_cluster_creates_both_entries() {
        let mut config = setup();
        let options = ClusterOptions {
            server: Some("https://10.0.0.5:6443".to_string()),
            ..ClusterOptions::new("lab", ClusterType::Ephemeral)
        };

        let id = config.add_cluster(&options).unwrap();

        assert_eq!(id.to_string(), "lab_ephemeral");
        assert!(config.is_dirty());
        let view = config.get_cluster("lab", ClusterType::Ephemeral).unwrap();
        assert_eq!(
            view.kube.unwrap().server.as_deref(),
            Some("https://10.0.0.5:6443")
        );
    }

    #[test]
    fn modify_cluster_only_touches_given_fields() {
        let mut config = setup();
        let before = kube_cluster(&config, "default_target").server.clone();

        let options = ClusterOptions {
            insecure_skip_tls_verify: true,
            ..ClusterOptions::new("default", ClusterType::Target)
        };
        config.modify_cluster(&options).unwrap();

        let cluster = kube_cluster(&config, "default_target");
        assert_eq!(cluster.server, before);
        assert_eq!(cluster.insecure_skip_tls_verify, Some(true));
    }

    #[test]
    fn cluster_module_references() {
        let mut config = setup();
        config
            .add_cluster(&ClusterOptions {
                bootstrap_info: Some("default".to_string()),
                ..ClusterOptions::new("lab", ClusterType::Ephemeral)
            })
            .unwrap();
        config
            .modify_cluster(&ClusterOptions {
                management_configuration: Some("dell".to_string()),
                bootstrap_info: Some(String::new()),
                ..ClusterOptions::new("lab", ClusterType::Ephemeral)
            })
            .unwrap();

        let view = config.get_cluster("lab", ClusterType::Ephemeral).unwrap();
        assert_eq!(view.profile.bootstrap_info, "default");
        assert_eq!(view.profile.management_configuration, "dell");
    }

    #[test]
    fn modify_missing_cluster_fails() {
        let mut config = setup();
        let err = config
            .modify_cluster(&ClusterOptions::new("nope", ClusterType::Target))
            .unwrap_err();
        assert!(err.is_missing_configuration());
        assert!(!config.is_dirty());
    }

    #[test]
    fn ca_trust_modes_are_exclusive() {
        let dir = TempDir::new().unwrap();
        let ca = dir.path().join("ca.pem");
        fs::write(&ca, b"PEM DATA").unwrap();
        let mut config = setup();

        // Embed: data set, path and insecure cleared
        config
            .modify_cluster(&ClusterOptions {
                certificate_authority: Some(ca.clone()),
                embed_ca_data: true,
                ..ClusterOptions::new("default", ClusterType::Target)
            })
            .unwrap();
        let cluster = kube_cluster(&config, "default_target");
        let data = cluster.certificate_authority_data.as_deref().unwrap();
        assert_eq!(decode_data(data).unwrap(), b"PEM DATA");
        assert!(cluster.certificate_authority.is_none());

        // Insecure: clears stored CA data
        config
            .modify_cluster(&ClusterOptions {
                insecure_skip_tls_verify: true,
                ..ClusterOptions::new("default", ClusterType::Target)
            })
            .unwrap();
        let cluster = kube_cluster(&config, "default_target");
        assert_eq!(cluster.insecure_skip_tls_verify, Some(true));
        assert!(!has_certificate_authority(cluster));

        // CA path: clears insecure mode
        config
            .modify_cluster(&ClusterOptions {
                certificate_authority: Some(ca.clone()),
                ..ClusterOptions::new("default", ClusterType::Target)
            })
            .unwrap();
        let cluster = kube_cluster(&config, "default_target");
        assert!(!cluster.insecure_skip_tls_verify.unwrap_or(false));
        assert_eq!(
            cluster.certificate_authority.as_deref(),
            Some(ca.display().to_string().as_str())
        );
        assert!(cluster.certificate_authority_data.is_none());
    }

    #[test]
    fn failed_ca_read_leaves_config_unchanged() {
        let dir = TempDir::new().unwrap();
        let mut config = setup();
        let before = config.kubeconfig().clone();

        let result = config.modify_cluster(&ClusterOptions {
            certificate_authority: Some(dir.path().join("missing.pem")),
            embed_ca_data: true,
            ..ClusterOptions::new("default", ClusterType::Target)
        });

        assert!(result.is_err());
        assert_eq!(config.kubeconfig(), &before);
        assert!(!config.is_dirty());
    }

    #[test]
    fn set_cluster_adds_then_modifies() {
        let mut config = setup();
        let options = ClusterOptions::new("lab", ClusterType::Target);
        assert!(config.set_cluster(&options).unwrap());
        assert!(!config.set_cluster(&options).unwrap());
    }

    #[test]
    fn mutations_require_reconciled_handle() {
        let mut config = Config::from_documents(Profile::default(), Kubeconfig::with_defaults());
        let result = config.add_cluster(&ClusterOptions::new("lab", ClusterType::Target));
        assert!(matches!(result, Err(ConfigError::InvalidState { .. })));
        assert_eq!(config.state(), ConfigState::Loaded);
    }

    #[test]
    fn added_context_references_canonical_cluster() {
        let mut config = setup();
        let options = ContextOptions {
            cluster: Some("default".to_string()),
            auth_info: Some("admin".to_string()),
            manifest: Some("default".to_string()),
            namespace: Some("kube-system".to_string()),
            ..ContextOptions::named("ops")
        };

        assert!(config.set_context(&options).unwrap());

        let view = config.get_context("ops").unwrap();
        assert_eq!(view.kube.unwrap().cluster, "default_target");
        assert_eq!(view.profile.name_in_kubeconf, "default_target");
        assert_eq!(view.profile.manifest, "default");
        assert_eq!(view.auth_info(), "admin");

        // The new context survives the next reconciliation
        assert!(!config.reconcile().unwrap().is_mutated());
    }

    #[test]
    fn modify_current_context() {
        let mut config = setup();
        let current = ContextOptions {
            current: true,
            manifest: Some("default".to_string()),
            ..ContextOptions::default()
        };
        assert!(config.modify_context(&current).unwrap_err().is_missing_configuration());

        config.use_context("default_target").unwrap();
        assert_eq!(config.modify_context(&current).unwrap(), "default_target");
        assert_eq!(
            config.get_context("default_target").unwrap().profile.manifest,
            "default"
        );
    }

    #[test]
    fn auth_info_partial_update() {
        let mut config = setup();
        config
            .modify_auth_info(&AuthInfoOptions {
                password: Some("hunter2".to_string()),
                ..AuthInfoOptions::named("admin")
            })
            .unwrap();

        let auth = &config.kubeconfig().auth_infos["admin"];
        assert_eq!(auth.username.as_deref(), Some("rackctl-admin"));
        assert_eq!(exposed(auth.password.as_ref()), Some("hunter2"));
    }

    #[test]
    fn auth_info_cert_embed_and_path_are_exclusive() {
        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("client.crt");
        let key = dir.path().join("client.key");
        fs::write(&cert, b"CERT").unwrap();
        fs::write(&key, b"KEY").unwrap();
        let mut config = setup();

        config
            .set_auth_info(&AuthInfoOptions {
                client_certificate: Some(cert.clone()),
                client_key: Some(key.clone()),
                embed_cert_data: true,
                ..AuthInfoOptions::named("ops")
            })
            .unwrap();
        let auth = &config.kubeconfig().auth_infos["ops"];
        let cert_data = auth.client_certificate_data.as_deref().unwrap();
        assert_eq!(decode_data(cert_data).unwrap(), b"CERT");
        let key_data = exposed(auth.client_key_data.as_ref()).unwrap();
        assert_eq!(decode_data(key_data).unwrap(), b"KEY");
        assert!(auth.client_certificate.is_none());

        config
            .modify_auth_info(&AuthInfoOptions {
                client_certificate: Some(cert),
                ..AuthInfoOptions::named("ops")
            })
            .unwrap();
        let auth = &config.kubeconfig().auth_infos["ops"];
        assert!(auth.client_certificate.is_some());
        assert!(auth.client_certificate_data.is_none());
        // The key was not mentioned and keeps its embedded data
        assert!(auth.client_key_data.is_some());
        assert!(config.profile().auth_infos.contains_key("ops"));
    }
}
