//! Reconciliation of the profile store with the credential store.
//!
//! The passes run in a fixed order, each consuming what the previous one
//! produced:
//!
//! 1. [`cluster::reconcile_clusters`] renames credential clusters to their
//!    canonical names, mirrors them into the profile and prunes stragglers.
//! 2. [`context::reconcile_contexts`] repairs context references broken by
//!    those renames, drops unrecoverable contexts and mirrors the rest.
//! 3. [`auth_info::reconcile_auth_infos`] mirrors credentials.
//! 4. [`current::reconcile_current_context`] arbitrates the current selection.
//!
//! Every pass is keyed by name and never depends on traversal order, so the
//! result is a fixed point: reconciling a reconciled pair changes nothing and
//! reports no mutation.

pub mod auth_info;
pub mod cluster;
pub mod context;
pub mod current;

use std::collections::BTreeMap;

use rackctl_core::ClusterIdentity;
use rackctl_store::{Kubeconfig, Profile};

/// What one reconciliation changed.
///
/// Creating a profile entry that mirrors an existing credential entry is not
/// recorded: it is derived from the credential store on every load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Credential cluster renames, old name to canonical name.
    pub renames: BTreeMap<String, String>,
    /// Profile cluster entries removed for lack of a credential cluster.
    pub pruned_clusters: Vec<ClusterIdentity>,
    /// Profile cluster names removed because no type is left under them.
    pub emptied_cluster_names: Vec<String>,
    /// Credential contexts whose cluster reference was rewritten.
    pub rewritten_contexts: Vec<String>,
    /// Credential contexts removed because their cluster does not exist.
    pub dropped_contexts: Vec<String>,
    /// Profile contexts removed for lack of a credential context.
    pub pruned_contexts: Vec<String>,
    /// Profile credentials removed for lack of a credential entry.
    pub pruned_auth_infos: Vec<String>,
    /// The current selection of either store was changed.
    pub current_repaired: bool,
}

impl ReconcileReport {
    /// Returns true if either store was changed and must be written.
    #[must_use]
    pub fn is_mutated(&self) -> bool {
        !self.renames.is_empty()
            || !self.pruned_clusters.is_empty()
            || !self.emptied_cluster_names.is_empty()
            || !self.rewritten_contexts.is_empty()
            || !self.dropped_contexts.is_empty()
            || !self.pruned_contexts.is_empty()
            || !self.pruned_auth_infos.is_empty()
            || self.current_repaired
    }
}

/// Run every reconciliation pass over the two stores, in order.
pub fn reconcile(profile: &mut Profile, kubeconfig: &mut Kubeconfig) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    cluster::reconcile_clusters(profile, kubeconfig, &mut report);
    context::reconcile_contexts(profile, kubeconfig, &mut report);
    auth_info::reconcile_auth_infos(profile, kubeconfig, &mut report);
    current::reconcile_current_context(profile, kubeconfig, &mut report);

    if report.is_mutated() {
        tracing::info!(
            renames = report.renames.len(),
            pruned_clusters = report.pruned_clusters.len(),
            emptied_cluster_names = report.emptied_cluster_names.len(),
            dropped_contexts = report.dropped_contexts.len(),
            pruned_contexts = report.pruned_contexts.len(),
            pruned_auth_infos = report.pruned_auth_infos.len(),
            current_repaired = report.current_repaired,
            "Reconciled configuration"
        );
    } else {
        tracing::debug!("Configuration already consistent");
    }

    report
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rackctl_store::{KubeAuthInfo, KubeCluster, KubeContext, Kubeconfig};

    /// A credential store with the given cluster names, `(name, cluster, user)`
    /// contexts and user names.
    pub fn kubeconfig(
        clusters: &[&str],
        contexts: &[(&str, &str, &str)],
        users: &[&str],
    ) -> Kubeconfig {
        let mut config = Kubeconfig::new();
        for name in clusters {
            config.clusters.insert(
                (*name).to_string(),
                KubeCluster {
                    server: Some(format!("https://{name}:6443")),
                    ..KubeCluster::default()
                },
            );
        }
        for (name, cluster, user) in contexts {
            config.contexts.insert(
                (*name).to_string(),
                KubeContext {
                    cluster: (*cluster).to_string(),
                    user: Some((*user).to_string()),
                    ..KubeContext::default()
                },
            );
        }
        for name in users {
            config
                .auth_infos
                .insert((*name).to_string(), KubeAuthInfo::default());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::kubeconfig;
    use super::*;
    use rackctl_core::ClusterType;

    #[test]
    fn rename_propagates_to_contexts() {
        let mut profile = Profile::default();
        let mut kube = kubeconfig(&["foo"], &[("ctx", "foo", "admin")], &["admin"]);

        let report = reconcile(&mut profile, &mut kube);

        assert!(report.is_mutated());
        assert_eq!(report.renames["foo"], "foo_target");
        assert!(kube.clusters.contains_key("foo_target"));
        assert!(!kube.clusters.contains_key("foo"));
        assert_eq!(kube.contexts["ctx"].cluster, "foo_target");
        assert_eq!(profile.contexts["ctx"].cluster_type(), ClusterType::Target);
        assert_eq!(report.rewritten_contexts, vec!["ctx".to_string()]);
    }

    #[test]
    fn second_run_is_a_fixed_point() {
        let mut profile = Profile::default();
        profile.current_context = "gone".to_string();
        let mut kube = kubeconfig(
            &["foo", "bar_ephemeral", "my_cluster"],
            &[
                ("a", "foo", "admin"),
                ("b", "bar_ephemeral", "admin"),
                ("dangling", "nowhere_target", "admin"),
            ],
            &["admin", "ops"],
        );
        kube.current_context = "b".to_string();

        let first = reconcile(&mut profile, &mut kube);
        assert!(first.is_mutated());

        let (profile_after, kube_after) = (profile.clone(), kube.clone());
        let second = reconcile(&mut profile, &mut kube);

        assert!(!second.is_mutated(), "second run mutated: {second:?}");
        assert_eq!(profile, profile_after);
        assert_eq!(kube, kube_after);
    }

    #[test]
    fn no_stragglers_after_reconcile() {
        let mut profile: Profile = serde_yaml::from_str(
            r"
clusters:
  old:
    clusterType:
      target:
        clusterKubeconf: old_target
contexts:
  stale:
    contextKubeconf: old_target
authInfos:
  ghost: {}
",
        )
        .unwrap();
        let mut kube = kubeconfig(
            &["lab_ephemeral", "lab_target"],
            &[("lab", "lab_target", "admin")],
            &["admin"],
        );

        reconcile(&mut profile, &mut kube);

        for group in profile.clusters.values() {
            for cluster in group.types.values() {
                assert!(kube.clusters.contains_key(&cluster.name_in_kubeconf));
            }
        }
        for name in profile.contexts.keys() {
            assert!(kube.contexts.contains_key(name));
        }
        assert!(profile.auth_infos.keys().eq(kube.auth_infos.keys()));
    }

    #[test]
    fn context_on_typeless_cluster_is_dropped() {
        let mut profile: Profile = serde_yaml::from_str(
            r"
clusters:
  ghost:
    clusterType: {}
contexts:
  c:
    contextKubeconf: ghost_target
",
        )
        .unwrap();
        let mut kube = kubeconfig(&[], &[("c", "ghost_target", "admin")], &["admin"]);

        let report = reconcile(&mut profile, &mut kube);

        assert!(report.is_mutated());
        assert!(profile.clusters.is_empty());
        assert_eq!(report.emptied_cluster_names, vec!["ghost".to_string()]);
        assert!(!kube.contexts.contains_key("c"));
        assert!(!profile.contexts.contains_key("c"));
        assert_eq!(report.dropped_contexts, vec!["c".to_string()]);
    }

    #[test]
    fn consistent_stores_report_nothing() {
        let mut profile = Profile::default();
        let mut kube = Kubeconfig::with_defaults();

        let report = reconcile(&mut profile, &mut kube);

        // Mirroring entries into an empty profile is not a mutation
        assert!(!report.is_mutated());
        assert!(profile.clusters.contains_key("default"));
        assert!(profile.contexts.contains_key("default_target"));
        assert!(profile.auth_infos.contains_key("admin"));
    }
}
