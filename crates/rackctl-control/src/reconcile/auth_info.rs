//! Credential reconciliation. Names are opaque; nothing is renamed.

use rackctl_store::{Kubeconfig, Profile};

use super::ReconcileReport;

/// Mirror credential entries into the profile and drop profile entries
/// without one.
pub fn reconcile_auth_infos(
    profile: &mut Profile,
    kubeconfig: &Kubeconfig,
    report: &mut ReconcileReport,
) {
    for name in kubeconfig.auth_infos.keys() {
        profile.auth_infos.entry(name.clone()).or_default();
    }

    profile.auth_infos.retain(|name, _| {
        let keep = kubeconfig.auth_infos.contains_key(name);
        if !keep {
            tracing::info!(auth_info = %name, "Pruned profile credential without credential entry");
            report.pruned_auth_infos.push(name.clone());
        }
        keep
    });
}
