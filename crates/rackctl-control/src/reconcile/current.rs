//! Current-selection arbitration.

use rackctl_store::{Kubeconfig, Profile};

use super::ReconcileReport;

/// Decide which store's current context is authoritative.
///
/// A valid profile selection wins and is copied to the credential store.
/// Otherwise a valid credential selection is adopted by the profile.
/// Otherwise both are left as they are. Validity means naming an existing
/// profile context.
pub fn reconcile_current_context(
    profile: &mut Profile,
    kubeconfig: &mut Kubeconfig,
    report: &mut ReconcileReport,
) {
    if profile.contexts.contains_key(&profile.current_context) {
        if kubeconfig.current_context != profile.current_context {
            tracing::info!(
                context = %profile.current_context,
                replaced = %kubeconfig.current_context,
                "Profile current context overrides credential store"
            );
            kubeconfig
                .current_context
                .clone_from(&profile.current_context);
            report.current_repaired = true;
        }
    } else if profile.contexts.contains_key(&kubeconfig.current_context) {
        tracing::info!(
            context = %kubeconfig.current_context,
            replaced = %profile.current_context,
            "Adopted credential store current context"
        );
        profile
            .current_context
            .clone_from(&kubeconfig.current_context);
        report.current_repaired = true;
    } else {
        tracing::debug!(
            profile = %profile.current_context,
            kubeconfig = %kubeconfig.current_context,
            "No valid current context in either store"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackctl_store::ContextProfile;

    fn stores(profile_current: &str, kube_current: &str) -> (Profile, Kubeconfig) {
        let mut profile = Profile::default();
        for name in ["A", "B"] {
            profile
                .contexts
                .insert(name.to_string(), ContextProfile::default());
        }
        profile.current_context = profile_current.to_string();
        let mut kube = Kubeconfig::new();
        kube.current_context = kube_current.to_string();
        (profile, kube)
    }

    fn run(profile: &mut Profile, kube: &mut Kubeconfig) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        reconcile_current_context(profile, kube, &mut report);
        report
    }

    #[test]
    fn valid_profile_selection_wins() {
        let (mut profile, mut kube) = stores("A", "B");
        let report = run(&mut profile, &mut kube);
        assert_eq!(profile.current_context, "A");
        assert_eq!(kube.current_context, "A");
        assert!(report.current_repaired);
    }

    #[test]
    fn valid_credential_selection_is_adopted() {
        let (mut profile, mut kube) = stores("missing", "B");
        let report = run(&mut profile, &mut kube);
        assert_eq!(profile.current_context, "B");
        assert_eq!(kube.current_context, "B");
        assert!(report.current_repaired);
    }

    #[test]
    fn agreeing_selection_is_not_a_mutation() {
        let (mut profile, mut kube) = stores("A", "A");
        assert!(!run(&mut profile, &mut kube).current_repaired);
    }

    #[test]
    fn invalid_selections_are_left_alone() {
        let (mut profile, mut kube) = stores("x", "y");
        let report = run(&mut profile, &mut kube);
        assert_eq!(profile.current_context, "x");
        assert_eq!(kube.current_context, "y");
        assert!(!report.current_repaired);
    }

    #[test]
    fn empty_selections_stay_empty() {
        let (mut profile, mut kube) = stores("", "");
        let report = run(&mut profile, &mut kube);
        assert!(profile.current_context.is_empty());
        assert!(!report.current_repaired);
    }
}
