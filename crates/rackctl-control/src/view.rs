//! Joined read-only views of a profile entry and its credential entry.
//!
//! The two halves are looked up by name at the point of use and borrowed for
//! the lifetime of the view only.

use rackctl_core::ClusterIdentity;
use rackctl_store::kubeconfig::secret;
use rackctl_store::types::render_yaml;
use rackctl_store::{
    AuthInfoProfile, ClusterProfile, ContextProfile, KubeAuthInfo, KubeCluster, KubeContext,
};

fn describe_pair<P: serde::Serialize, K: serde::Serialize>(
    profile: &P,
    kube: Option<&K>,
) -> String {
    let mut out = render_yaml(profile);
    if let Some(kube) = kube {
        out.push_str(&render_yaml(kube));
    }
    out
}

/// A cluster as seen through both stores.
#[derive(Debug, Clone, Copy)]
pub struct ClusterView<'a> {
    /// Profile entry.
    pub profile: &'a ClusterProfile,
    /// Credential entry, looked up by canonical name.
    pub kube: Option<&'a KubeCluster>,
}

impl ClusterView<'_> {
    /// The identity of the cluster.
    #[must_use]
    pub fn identity(&self) -> ClusterIdentity {
        self.profile.identity()
    }

    /// Profile entry YAML followed by credential entry YAML.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Cluster: {}\n{}",
            self.profile.name_in_kubeconf,
            describe_pair(self.profile, self.kube)
        )
    }
}

/// A context as seen through both stores.
#[derive(Debug, Clone, Copy)]
pub struct ContextView<'a> {
    /// Context name, shared by both stores.
    pub name: &'a str,
    /// Profile entry.
    pub profile: &'a ContextProfile,
    /// Credential entry.
    pub kube: Option<&'a KubeContext>,
}

impl ContextView<'_> {
    /// Name of the credential used by the context, or empty.
    #[must_use]
    pub fn auth_info(&self) -> &str {
        self.kube.and_then(|k| k.user.as_deref()).unwrap_or("")
    }

    /// Profile entry YAML followed by credential entry YAML.
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "Context: {}\n{}",
            self.name,
            describe_pair(self.profile, self.kube)
        )
    }
}

/// A credential as seen through both stores.
#[derive(Debug, Clone, Copy)]
pub struct AuthInfoView<'a> {
    /// Credential name, shared by both stores.
    pub name: &'a str,
    /// Profile entry.
    pub profile: &'a AuthInfoProfile,
    /// Credential entry.
    pub kube: Option<&'a KubeAuthInfo>,
}

impl AuthInfoView<'_> {
    /// Profile entry YAML followed by credential entry YAML, with secrets
    /// redacted.
    #[must_use]
    pub fn describe(&self) -> String {
        let redacted = self.kube.map(redact);
        format!(
            "User: {}\n{}",
            self.name,
            describe_pair(self.profile, redacted.as_ref())
        )
    }
}

fn redact(auth: &KubeAuthInfo) -> KubeAuthInfo {
    const REDACTED: &str = "redacted";
    let mut redacted = auth.clone();
    if redacted.client_certificate_data.is_some() {
        redacted.client_certificate_data = Some(REDACTED.to_string());
    }
    for field in [
        &mut redacted.client_key_data,
        &mut redacted.token,
        &mut redacted.password,
    ] {
        if field.is_some() {
            *field = Some(secret(REDACTED));
        }
    }
    redacted
}
