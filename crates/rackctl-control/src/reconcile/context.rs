//! Context reconciliation.

use rackctl_core::ClusterIdentity;
use rackctl_store::{Kubeconfig, Profile};

use super::ReconcileReport;

/// Synchronize profile contexts with credential contexts.
///
/// Must run after [`reconcile_clusters`](super::cluster::reconcile_clusters):
/// it consumes the rename table and checks references against the pruned
/// profile clusters.
///
/// A credential context whose cluster was renamed has its reference rewritten.
/// One whose cluster name is unknown to the profile cannot be repaired and is
/// deleted. Every surviving context is mirrored into the profile, and profile
/// contexts without a credential context are removed.
pub fn reconcile_contexts(
    profile: &mut Profile,
    kubeconfig: &mut Kubeconfig,
    report: &mut ReconcileReport,
) {
    let names: Vec<String> = kubeconfig.contexts.keys().cloned().collect();

    for name in names {
        let Some(context) = kubeconfig.contexts.get_mut(&name) else {
            continue;
        };

        if let Some(renamed) = report.renames.get(&context.cluster) {
            tracing::info!(
                context = %name,
                from = %context.cluster,
                to = %renamed,
                "Rewrote context cluster reference"
            );
            context.cluster.clone_from(renamed);
            report.rewritten_contexts.push(name.clone());
        }

        let identity = ClusterIdentity::canonicalize(&context.cluster);
        if !profile.clusters.contains_key(identity.name()) {
            tracing::warn!(
                context = %name,
                cluster = %context.cluster,
                "Deleted context referencing an unknown cluster"
            );
            kubeconfig.contexts.remove(&name);
            report.dropped_contexts.push(name);
            continue;
        }

        let reference = context.cluster.clone();
        profile.contexts.entry(name).or_default().name_in_kubeconf = reference;
    }

    profile.contexts.retain(|name, _| {
        let keep = kubeconfig.contexts.contains_key(name);
        if !keep {
            tracing::info!(context = %name, "Pruned profile context without credential entry");
            report.pruned_contexts.push(name.clone());
        }
        keep
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::cluster::reconcile_clusters;
    use crate::reconcile::fixtures::kubeconfig;
    use rackctl_core::ClusterType;
    use rackctl_store::ContextProfile;

    fn run(profile: &mut Profile, kube: &mut Kubeconfig) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        reconcile_clusters(profile, kube, &mut report);
        reconcile_contexts(profile, kube, &mut report);
        report
    }

    #[test]
    fn context_mirrors_cluster_reference() {
        let mut profile = Profile::default();
        let mut kube = kubeconfig(&["lab_ephemeral"], &[("boot", "lab_ephemeral", "admin")], &[]);

        let report = run(&mut profile, &mut kube);

        assert!(!report.is_mutated());
        let context = &profile.contexts["boot"];
        assert_eq!(context.name_in_kubeconf, "lab_ephemeral");
        assert_eq!(context.cluster_type(), ClusterType::Ephemeral);
    }

    #[test]
    fn renamed_cluster_reference_is_rewritten() {
        let mut profile = Profile::default();
        let mut kube = kubeconfig(&["foo"], &[("ctx", "foo", "admin")], &[]);

        let report = run(&mut profile, &mut kube);

        assert_eq!(kube.contexts["ctx"].cluster, "foo_target");
        assert_eq!(profile.contexts["ctx"].name_in_kubeconf, "foo_target");
        assert_eq!(report.rewritten_contexts, vec!["ctx".to_string()]);
    }

    #[test]
    fn unknown_cluster_reference_is_dropped() {
        let mut profile = Profile::default();
        profile
            .contexts
            .insert("orphan".to_string(), ContextProfile::default());
        let mut kube = kubeconfig(&["lab_target"], &[("orphan", "missing_target", "admin")], &[]);

        let report = run(&mut profile, &mut kube);

        assert!(!kube.contexts.contains_key("orphan"));
        assert!(!profile.contexts.contains_key("orphan"));
        assert_eq!(report.dropped_contexts, vec!["orphan".to_string()]);
        assert_eq!(report.pruned_contexts, vec!["orphan".to_string()]);
    }

    #[test]
    fn profile_only_context_is_pruned() {
        let mut profile = Profile::default();
        profile.contexts.insert(
            "stale".to_string(),
            ContextProfile {
                name_in_kubeconf: "lab_target".to_string(),
                manifest: "default".to_string(),
            },
        );
        let mut kube = kubeconfig(&["lab_target"], &[], &[]);

        let report = run(&mut profile, &mut kube);

        assert!(profile.contexts.is_empty());
        assert_eq!(report.pruned_contexts, vec!["stale".to_string()]);
    }

    #[test]
    fn existing_manifest_survives_rebinding() {
        let mut profile = Profile::default();
        profile.contexts.insert(
            "ctx".to_string(),
            ContextProfile {
                name_in_kubeconf: "foo".to_string(),
                manifest: "site".to_string(),
            },
        );
        let mut kube = kubeconfig(&["foo"], &[("ctx", "foo", "admin")], &[]);

        run(&mut profile, &mut kube);

        assert_eq!(profile.contexts["ctx"].manifest, "site");
        assert_eq!(profile.contexts["ctx"].name_in_kubeconf, "foo_target");
    }
}
