//! Completeness validation.
//!
//! Downstream consumers call [`ensure_complete`] before trusting any resolved
//! value. It is read-only and reports the first gap found.

use rackctl_store::Profile;

use crate::error::{ConfigError, Result};

/// Verify that a profile is ready to use.
///
/// A complete profile meets the following criteria:
///
/// - at least one cluster, credential, context and manifest is defined
/// - the current context is set and names an existing context
/// - that context names an existing manifest
///
/// # Errors
///
/// Returns `ConfigError::MissingConfiguration` describing the first gap.
pub fn ensure_complete(profile: &Profile) -> Result<()> {
    if profile.clusters.is_empty() {
        return Err(ConfigError::missing(
            "At least one cluster needs to be defined",
        ));
    }

    if profile.auth_infos.is_empty() {
        return Err(ConfigError::missing(
            "At least one Authentication Information (User) needs to be defined",
        ));
    }

    if profile.contexts.is_empty() {
        return Err(ConfigError::missing(
            "At least one Context needs to be defined",
        ));
    }

    if profile.manifests.is_empty() {
        return Err(ConfigError::missing(
            "At least one Manifest needs to be defined",
        ));
    }

    if profile.current_context.is_empty() {
        return Err(ConfigError::missing("Current Context is not defined"));
    }

    let Some(context) = profile.contexts.get(&profile.current_context) else {
        return Err(ConfigError::missing(format!(
            "Current Context ({}) does not identify a defined Context",
            profile.current_context
        )));
    };

    if !profile.manifests.contains_key(&context.manifest) {
        return Err(ConfigError::missing(format!(
            "Current Context ({}) does not identify a defined Manifest ({})",
            profile.current_context, context.manifest
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackctl_core::ClusterType;
    use rackctl_store::{AuthInfoProfile, ClusterGroup, ClusterProfile, ContextProfile};

    fn complete_profile() -> Profile {
        let mut profile = Profile::default();
        let mut group = ClusterGroup::default();
        group.types.insert(
            ClusterType::Target,
            ClusterProfile {
                name_in_kubeconf: "lab_target".to_string(),
                ..ClusterProfile::default()
            },
        );
        profile.clusters.insert("lab".to_string(), group);
        profile
            .auth_infos
            .insert("admin".to_string(), AuthInfoProfile {});
        profile.contexts.insert(
            "lab".to_string(),
            ContextProfile {
                name_in_kubeconf: "lab_target".to_string(),
                manifest: "default".to_string(),
            },
        );
        profile.current_context = "lab".to_string();
        profile
    }

    fn gap(profile: &Profile) -> String {
        match ensure_complete(profile) {
            Err(ConfigError::MissingConfiguration { what }) => what,
            other => panic!("expected MissingConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn complete_profile_passes() {
        assert!(ensure_complete(&complete_profile()).is_ok());
    }

    #[test]
    fn empty_clusters_named() {
        let mut profile = complete_profile();
        profile.clusters.clear();
        assert!(gap(&profile).contains("cluster"));
    }

    #[test]
    fn empty_collections_named() {
        let mut profile = complete_profile();
        profile.auth_infos.clear();
        assert!(gap(&profile).contains("User"));

        let mut profile = complete_profile();
        profile.contexts.clear();
        assert!(gap(&profile).contains("Context"));

        let mut profile = complete_profile();
        profile.manifests.clear();
        assert!(gap(&profile).contains("Manifest"));
    }

    #[test]
    fn current_context_required() {
        let mut profile = complete_profile();
        profile.current_context.clear();
        assert_eq!(gap(&profile), "Current Context is not defined");

        profile.current_context = "nope".to_string();
        assert!(gap(&profile).contains("(nope)"));
    }

    #[test]
    fn missing_manifest_named() {
        let mut profile = complete_profile();
        profile.contexts.get_mut("lab").unwrap().manifest = "site".to_string();
        let what = gap(&profile);
        assert!(what.contains("Manifest (site)"), "{what}");
    }
}
