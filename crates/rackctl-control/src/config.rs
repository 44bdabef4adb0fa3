//! The configuration handle.
//!
//! [`Config`] owns both documents for one invocation and enforces the
//! load → reconcile → persist lifecycle. Every accessor and mutator takes the
//! handle explicitly; there is no process-wide configuration.

use std::path::PathBuf;

use rackctl_core::{ClusterIdentity, ClusterType};
use rackctl_store::{
    Bootstrap, Kubeconfig, ManagementConfiguration, Manifest, Profile, Store,
};

use crate::error::{ConfigError, LookupKind, Result};
use crate::lifecycle::{self, ConfigState};
use crate::reconcile::{self, ReconcileReport};
use crate::validate;
use crate::view::{AuthInfoView, ClusterView, ContextView};

/// Both stores, held for one load/reconcile/persist cycle.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub(crate) profile: Profile,
    pub(crate) kubeconfig: Kubeconfig,
    state: ConfigState,
    dirty: bool,
    last_report: ReconcileReport,
}

impl Config {
    /// Create an unloaded handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loaded handle over in-memory documents.
    #[must_use]
    pub fn from_documents(profile: Profile, kubeconfig: Kubeconfig) -> Self {
        Self {
            profile,
            kubeconfig,
            state: ConfigState::Loaded,
            ..Self::default()
        }
    }

    /// Load, reconcile, and persist if reconciliation changed anything.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be read, decoded or written.
    pub fn open<S: Store>(store: &S) -> Result<Self> {
        let mut config = Self::new();
        config.load(store)?;
        config.reconcile()?;
        config.persist_if_dirty(store)?;
        Ok(config)
    }

    /// Read both documents, synthesizing defaults for missing ones.
    ///
    /// Synthesized defaults do not make the handle dirty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if already loaded, or the storage error.
    pub fn load<S: Store>(&mut self, store: &S) -> Result<()> {
        let next = lifecycle::validate_transition(self.state, ConfigState::Loaded)?;

        self.profile = match store.read_profile()? {
            Some(profile) => profile,
            None => {
                tracing::debug!(location = %store.location(), "No profile found, using defaults");
                Profile::default()
            }
        };
        self.kubeconfig = match store.read_kubeconfig()? {
            Some(kubeconfig) => kubeconfig,
            None => {
                tracing::debug!(location = %store.location(), "No kubeconfig found, using defaults");
                Kubeconfig::with_defaults()
            }
        };

        self.state = next;
        Ok(())
    }

    /// Run every reconciliation pass and remember the report.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if nothing has been loaded.
    pub fn reconcile(&mut self) -> Result<&ReconcileReport> {
        let next = lifecycle::validate_transition(self.state, ConfigState::Reconciled)?;

        self.last_report = reconcile::reconcile(&mut self.profile, &mut self.kubeconfig);
        if self.last_report.is_mutated() {
            self.dirty = true;
        }

        self.state = next;
        Ok(&self.last_report)
    }

    /// Write both documents in full.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the handle is not reconciled, or the storage
    /// error. The documents are written one after the other; a failure on the
    /// second leaves the first written.
    pub fn persist<S: Store>(&mut self, store: &S) -> Result<()> {
        let next = lifecycle::validate_transition(self.state, ConfigState::Persisted)?;

        store.write_profile(&self.profile)?;
        store.write_kubeconfig(&self.kubeconfig)?;

        tracing::info!(location = %store.location(), "Persisted configuration");
        self.dirty = false;
        self.state = next;
        Ok(())
    }

    /// Persist only if something changed since the last write.
    ///
    /// Returns whether anything was written.
    ///
    /// # Errors
    ///
    /// Same as [`Config::persist`].
    pub fn persist_if_dirty<S: Store>(&mut self, store: &S) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.persist(store)?;
        Ok(true)
    }

    /// Delete the profile file. The credential file is kept.
    ///
    /// # Errors
    ///
    /// Returns the storage error, including when the file does not exist.
    pub fn purge<S: Store>(&self, store: &S) -> Result<()> {
        store.remove_profile()?;
        tracing::info!(location = %store.location(), "Purged profile");
        Ok(())
    }

    /// The lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConfigState {
        self.state
    }

    /// Returns true if there are unpersisted changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// What the last reconciliation changed.
    #[must_use]
    pub const fn last_report(&self) -> &ReconcileReport {
        &self.last_report
    }

    /// The profile store.
    #[must_use]
    pub const fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The credential store.
    #[must_use]
    pub const fn kubeconfig(&self) -> &Kubeconfig {
        &self.kubeconfig
    }

    /// The profile rendered as YAML, or empty on failure.
    #[must_use]
    pub fn to_yaml_string(&self) -> String {
        self.profile.to_yaml_string()
    }

    /// Mark a mutation: the handle becomes reconciled and dirty.
    pub(crate) fn touch(&mut self) -> Result<()> {
        self.require_consistent()?;
        self.state = lifecycle::validate_transition(self.state, ConfigState::Reconciled)?;
        self.dirty = true;
        Ok(())
    }

    pub(crate) fn require_consistent(&self) -> Result<()> {
        if lifecycle::is_consistent(self.state) {
            Ok(())
        } else {
            Err(ConfigError::InvalidState {
                from: self.state,
                to: ConfigState::Reconciled,
            })
        }
    }

    /// Check every manifest repository.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRepository` naming the first invalid repository.
    pub fn validate_manifests(&self) -> Result<()> {
        for manifest in self.profile.manifests.values() {
            manifest
                .validate()
                .map_err(|(name, source)| ConfigError::InvalidRepository { name, source })?;
        }
        Ok(())
    }

    /// Verify completeness. See [`validate::ensure_complete`].
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` describing the first gap.
    pub fn ensure_complete(&self) -> Result<()> {
        validate::ensure_complete(&self.profile)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    fn cluster_view(&self, id: &ClusterIdentity) -> Option<ClusterView<'_>> {
        self.profile.cluster(id).map(|profile| ClusterView {
            profile,
            kube: self.kubeconfig.clusters.get(&profile.name_in_kubeconf),
        })
    }

    /// Look up one cluster by name and type.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if no such cluster exists.
    pub fn get_cluster(&self, name: &str, cluster_type: ClusterType) -> Result<ClusterView<'_>> {
        self.cluster_view(&ClusterIdentity::new(name, cluster_type))
            .ok_or_else(|| {
                ConfigError::missing(format!(
                    "Cluster with name '{name}' of type '{cluster_type}'"
                ))
            })
    }

    /// Every cluster, ordered by name and then by type.
    #[must_use]
    pub fn clusters(&self) -> Vec<ClusterView<'_>> {
        self.profile
            .clusters
            .values()
            .flat_map(|group| group.types.values())
            .map(|profile| ClusterView {
                profile,
                kube: self.kubeconfig.clusters.get(&profile.name_in_kubeconf),
            })
            .collect()
    }

    /// Look up one context.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if no such context exists.
    pub fn get_context(&self, name: &str) -> Result<ContextView<'_>> {
        self.profile
            .contexts
            .get_key_value(name)
            .map(|(name, profile)| ContextView {
                name,
                profile,
                kube: self.kubeconfig.contexts.get(name),
            })
            .ok_or_else(|| ConfigError::missing(format!("Context with name '{name}'")))
    }

    /// Every context, ordered by name.
    #[must_use]
    pub fn contexts(&self) -> Vec<ContextView<'_>> {
        self.profile
            .contexts
            .iter()
            .map(|(name, profile)| ContextView {
                name,
                profile,
                kube: self.kubeconfig.contexts.get(name),
            })
            .collect()
    }

    /// Look up one credential.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if no such credential exists.
    pub fn get_auth_info(&self, name: &str) -> Result<AuthInfoView<'_>> {
        self.profile
            .auth_infos
            .get_key_value(name)
            .map(|(name, profile)| AuthInfoView {
                name,
                profile,
                kube: self.kubeconfig.auth_infos.get(name),
            })
            .ok_or_else(|| {
                ConfigError::missing(format!("User credentials with name '{name}'"))
            })
    }

    /// Every credential, ordered by name.
    #[must_use]
    pub fn auth_infos(&self) -> Vec<AuthInfoView<'_>> {
        self.profile
            .auth_infos
            .iter()
            .map(|(name, profile)| AuthInfoView {
                name,
                profile,
                kube: self.kubeconfig.auth_infos.get(name),
            })
            .collect()
    }

    /// Render one cluster, or an empty string if it does not exist.
    #[must_use]
    pub fn describe_cluster(&self, name: &str, cluster_type: ClusterType) -> String {
        self.get_cluster(name, cluster_type)
            .map(|view| view.describe())
            .unwrap_or_default()
    }

    /// Render one context, or an empty string if it does not exist.
    #[must_use]
    pub fn describe_context(&self, name: &str) -> String {
        self.get_context(name)
            .map(|view| view.describe())
            .unwrap_or_default()
    }

    /// Render one credential, or an empty string if it does not exist.
    #[must_use]
    pub fn describe_auth_info(&self, name: &str) -> String {
        self.get_auth_info(name)
            .map(|view| view.describe())
            .unwrap_or_default()
    }

    // =========================================================================
    // Current context resolution
    // =========================================================================

    /// The current context, after a completeness check.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before reconciliation and `MissingConfiguration`
    /// for an incomplete profile.
    pub fn current_context(&self) -> Result<ContextView<'_>> {
        self.require_consistent()?;
        self.ensure_complete()?;
        self.get_context(&self.profile.current_context)
    }

    /// The cluster the current context points at.
    ///
    /// # Errors
    ///
    /// As [`Config::current_context`], plus `MissingConfiguration` if the
    /// referenced cluster is not defined.
    pub fn current_context_cluster(&self) -> Result<ClusterView<'_>> {
        let context = self.current_context()?;
        let id = ClusterIdentity::canonicalize(&context.profile.name_in_kubeconf);
        self.cluster_view(&id).ok_or_else(|| {
            ConfigError::missing(format!(
                "Current Context ({}) does not identify a defined Cluster ({id})",
                context.name
            ))
        })
    }

    /// The credential the current context uses.
    ///
    /// # Errors
    ///
    /// As [`Config::current_context`], plus `MissingConfiguration` if the
    /// referenced credential is not defined.
    pub fn current_context_auth_info(&self) -> Result<AuthInfoView<'_>> {
        let context = self.current_context()?;
        self.get_auth_info(context.auth_info())
    }

    /// The manifest of the current context.
    ///
    /// # Errors
    ///
    /// As [`Config::current_context`].
    pub fn current_context_manifest(&self) -> Result<&Manifest> {
        let context = self.current_context()?;
        self.profile
            .manifests
            .get(&context.profile.manifest)
            .ok_or_else(|| {
                ConfigError::missing(format!(
                    "Current Context ({}) does not identify a defined Manifest ({})",
                    context.name, context.profile.manifest
                ))
            })
    }

    /// Path of the document bundle for a cluster type and phase:
    /// `<targetPath>/<subPath>/<clusterType>/<phase>`.
    ///
    /// # Errors
    ///
    /// As [`Config::current_context_manifest`], plus `MissingPrimaryRepository`
    /// if the manifest's primary repository is not defined.
    pub fn current_context_entry_point(
        &self,
        cluster_type: ClusterType,
        phase: &str,
    ) -> Result<PathBuf> {
        let context = self.current_context()?;
        let manifest = self.current_context_manifest()?;
        if manifest.primary_repository().is_none() {
            return Err(ConfigError::MissingPrimaryRepository {
                manifest: context.profile.manifest.clone(),
            });
        }

        let mut path = PathBuf::from(&manifest.target_path);
        if !manifest.sub_path.is_empty() {
            path.push(&manifest.sub_path);
        }
        path.push(cluster_type.as_str());
        path.push(phase);
        Ok(path)
    }

    /// The bootstrap record of the current cluster.
    ///
    /// # Errors
    ///
    /// As [`Config::current_context_cluster`], plus `MissingConfiguration` if
    /// the cluster names no record and `NamedLookupNotFound` if the named
    /// record does not exist.
    pub fn current_context_bootstrap_info(&self) -> Result<&Bootstrap> {
        let cluster = self.current_context_cluster()?;
        let name = &cluster.profile.bootstrap_info;
        if name.is_empty() {
            return Err(ConfigError::missing(format!(
                "No bootstrap-info defined for context {:?}",
                self.profile.current_context
            )));
        }
        self.profile
            .modules
            .bootstrap_info
            .get(name)
            .ok_or_else(|| ConfigError::NamedLookupNotFound {
                kind: LookupKind::BootstrapInfo,
                name: name.clone(),
            })
    }

    /// The management record of the current cluster.
    ///
    /// # Errors
    ///
    /// As [`Config::current_context_bootstrap_info`], for the management
    /// configuration reference.
    pub fn current_context_management_config(&self) -> Result<&ManagementConfiguration> {
        let cluster = self.current_context_cluster()?;
        let name = &cluster.profile.management_configuration;
        if name.is_empty() {
            return Err(ConfigError::missing(format!(
                "No management config defined for context {:?}",
                self.profile.current_context
            )));
        }
        self.profile
            .modules
            .management_configuration
            .get(name)
            .ok_or_else(|| ConfigError::NamedLookupNotFound {
                kind: LookupKind::ManagementConfiguration,
                name: name.clone(),
            })
    }

    /// Select a context in both stores.
    ///
    /// # Errors
    ///
    /// Returns `MissingConfiguration` if the context does not exist, and
    /// `InvalidState` before reconciliation.
    pub fn use_context(&mut self, name: &str) -> Result<()> {
        self.require_consistent()?;
        if !self.profile.contexts.contains_key(name) {
            return Err(ConfigError::missing(format!("Context with name '{name}'")));
        }
        if self.profile.current_context == name && self.kubeconfig.current_context == name {
            tracing::debug!(context = %name, "Context already selected");
            return Ok(());
        }

        self.touch()?;
        self.profile.current_context = name.to_string();
        self.kubeconfig.current_context = name.to_string();
        tracing::info!(context = %name, "Switched current context");
        Ok(())
    }
}
