//! Cluster reconciliation.

use rackctl_core::ClusterIdentity;
use rackctl_store::{Kubeconfig, Profile};

use super::ReconcileReport;

/// Synchronize profile clusters with credential clusters.
///
/// Every credential cluster is moved to its canonical name, recording the
/// rename, and gets a profile entry pointing back at it. Profile entries whose
/// credential cluster no longer exists are then removed, together with any
/// cluster name left without types.
///
/// If both `foo` and its canonical form `foo_target` exist, the entry already
/// under the canonical name is kept and `foo` is discarded. The rename is still
/// recorded so contexts naming `foo` are repaired.
pub fn reconcile_clusters(
    profile: &mut Profile,
    kubeconfig: &mut Kubeconfig,
    report: &mut ReconcileReport,
) {
    let raw_names: Vec<String> = kubeconfig.clusters.keys().cloned().collect();

    for raw in raw_names {
        let identity = ClusterIdentity::canonicalize(&raw);
        let canonical = identity.to_string();

        if raw != canonical {
            if let Some(entry) = kubeconfig.clusters.remove(&raw) {
                if kubeconfig.clusters.contains_key(&canonical) {
                    tracing::warn!(
                        cluster = %raw,
                        canonical = %canonical,
                        "Discarding credential cluster shadowed by its canonical name"
                    );
                } else {
                    kubeconfig.clusters.insert(canonical.clone(), entry);
                }
            }
            tracing::info!(from = %raw, to = %canonical, "Renamed credential cluster");
            report.renames.insert(raw, canonical.clone());
        }

        let entry = profile
            .clusters
            .entry(identity.name().to_string())
            .or_default()
            .types
            .entry(identity.cluster_type())
            .or_default();
        entry.name_in_kubeconf = canonical;
    }

    prune_stragglers(profile, kubeconfig, report);
}

/// Remove profile cluster entries whose credential cluster is gone, then any
/// cluster name left without types, including one that never had any.
fn prune_stragglers(profile: &mut Profile, kubeconfig: &Kubeconfig, report: &mut ReconcileReport) {
    let mut emptied = Vec::new();

    for (name, group) in &mut profile.clusters {
        group.types.retain(|cluster_type, cluster| {
            let keep = kubeconfig.clusters.contains_key(&cluster.name_in_kubeconf);
            if !keep {
                tracing::info!(
                    cluster = %name,
                    cluster_type = %cluster_type,
                    reference = %cluster.name_in_kubeconf,
                    "Pruned profile cluster without credential entry"
                );
                report
                    .pruned_clusters
                    .push(ClusterIdentity::new(name.clone(), *cluster_type));
            }
            keep
        });
        if group.types.is_empty() {
            emptied.push(name.clone());
        }
    }

    for name in emptied {
        tracing::info!(cluster = %name, "Pruned profile cluster name without types");
        profile.clusters.remove(&name);
        report.emptied_cluster_names.push(name);
    }
}
