//! Option records for the accessor/mutator API.
//!
//! Each record carries the fields a caller wants to change. Unset and empty
//! fields are left untouched by a modify call.

use std::fs;
use std::path::{Path, PathBuf};

use rackctl_core::{ClusterIdentity, ClusterType};

use crate::error::{ConfigError, Result};

/// Return the value if it is set and non-empty.
pub(crate) fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

fn ensure_readable(path: &Path, what: &str) -> Result<()> {
    fs::File::open(path).map(drop).map_err(|e| {
        ConfigError::invalid(format!(
            "could not read {what} data from {}: {e}",
            path.display()
        ))
    })
}

/// Changes to one cluster.
#[derive(Debug, Clone, Default)]
pub struct ClusterOptions {
    /// Cluster name, without type suffix.
    pub name: String,
    /// Cluster type, parsed by [`ClusterOptions::validate`].
    pub cluster_type: String,
    /// API server URL.
    pub server: Option<String>,
    /// Skip server certificate verification. Clears any CA setting.
    pub insecure_skip_tls_verify: bool,
    /// Path to a CA bundle. Clears insecure mode.
    pub certificate_authority: Option<PathBuf>,
    /// Read the CA bundle into the credential store instead of storing the path.
    pub embed_ca_data: bool,
    /// Name of the bootstrap-info record the cluster uses.
    pub bootstrap_info: Option<String>,
    /// Name of the management configuration the cluster uses.
    pub management_configuration: Option<String>,
}

impl ClusterOptions {
    /// Create options naming a cluster, with no changes.
    #[must_use]
    pub fn new(name: impl Into<String>, cluster_type: ClusterType) -> Self {
        Self {
            name: name.into(),
            cluster_type: cluster_type.to_string(),
            ..Self::default()
        }
    }

    /// The identity these options address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidClusterType` if the type is not recognized.
    pub fn identity(&self) -> Result<ClusterIdentity> {
        let cluster_type = self.cluster_type.parse::<ClusterType>()?;
        Ok(ClusterIdentity::new(self.name.clone(), cluster_type))
    }

    /// Check the options before any mutation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an empty name, insecure mode combined
    /// with a CA file, or a CA embed without a readable file; and
    /// `InvalidClusterType` for an unknown type.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("you must specify a non-empty cluster name"));
        }
        self.identity()?;

        if self.insecure_skip_tls_verify && self.certificate_authority.is_some() {
            return Err(ConfigError::invalid(
                "you cannot specify a certificate-authority and insecure mode at the same time",
            ));
        }

        if self.embed_ca_data {
            let Some(path) = &self.certificate_authority else {
                return Err(ConfigError::invalid(
                    "you must specify a certificate-authority to embed",
                ));
            };
            ensure_readable(path, "certificate-authority")?;
        }
        Ok(())
    }
}

/// Changes to one context.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Context name. Mutually exclusive with `current`.
    pub name: Option<String>,
    /// Address the current context instead of a named one.
    pub current: bool,
    /// Cluster the context points at.
    pub cluster: Option<String>,
    /// Type of that cluster. Without it, the cluster name is canonicalized.
    pub cluster_type: Option<String>,
    /// Credential used by the context.
    pub auth_info: Option<String>,
    /// Manifest deployed through the context.
    pub manifest: Option<String>,
    /// Default namespace.
    pub namespace: Option<String>,
}

impl ContextOptions {
    /// Create options naming a context, with no changes.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Check the options before any mutation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` unless exactly one of a name and
    /// `current` is given, and `InvalidClusterType` for an unknown type.
    pub fn validate(&self) -> Result<()> {
        let named = non_empty(self.name.as_ref()).is_some();
        if self.current && named {
            return Err(ConfigError::invalid(
                "you cannot specify a context name and the current flag at the same time",
            ));
        }
        if !self.current && !named {
            return Err(ConfigError::invalid("you must specify a non-empty context name"));
        }
        if let Some(cluster_type) = non_empty(self.cluster_type.as_ref()) {
            cluster_type.parse::<ClusterType>()?;
        }
        Ok(())
    }

    /// The canonical cluster reference these options set, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidClusterType` if the type is not recognized.
    pub fn cluster_reference(&self) -> Result<Option<String>> {
        let Some(cluster) = non_empty(self.cluster.as_ref()) else {
            return Ok(None);
        };
        let identity = match non_empty(self.cluster_type.as_ref()) {
            Some(cluster_type) => ClusterIdentity::new(cluster, cluster_type.parse()?),
            None => ClusterIdentity::canonicalize(cluster),
        };
        Ok(Some(identity.to_string()))
    }
}

/// Changes to one credential.
#[derive(Debug, Clone, Default)]
pub struct AuthInfoOptions {
    /// Credential name.
    pub name: String,
    /// Path to a client certificate.
    pub client_certificate: Option<PathBuf>,
    /// Path to a client key.
    pub client_key: Option<PathBuf>,
    /// Bearer token. Mutually exclusive with basic auth.
    pub token: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Read the certificate and key into the credential store instead of
    /// storing the paths.
    pub embed_cert_data: bool,
}

impl AuthInfoOptions {
    /// Create options naming a credential, with no changes.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check the options before any mutation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an empty name, a token combined with
    /// basic auth, or a certificate embed without readable files.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("you must specify a non-empty credential name"));
        }

        let basic = non_empty(self.username.as_ref()).is_some()
            || non_empty(self.password.as_ref()).is_some();
        if non_empty(self.token.as_ref()).is_some() && basic {
            return Err(ConfigError::invalid(
                "you cannot specify more than one authentication method at the same time: token or username/password",
            ));
        }

        if self.embed_cert_data {
            let Some(cert) = &self.client_certificate else {
                return Err(ConfigError::invalid(
                    "you must specify a client-certificate to embed",
                ));
            };
            ensure_readable(cert, "client-certificate")?;
            if let Some(key) = &self.client_key {
                ensure_readable(key, "client-key")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cluster_name_required() {
        let options = ClusterOptions::new("", ClusterType::Target);
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn cluster_type_must_be_known() {
        let options = ClusterOptions {
            name: "lab".to_string(),
            cluster_type: "staging".to_string(),
            ..ClusterOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidClusterType(_))
        ));
    }

    #[test]
    fn insecure_and_ca_file_conflict() {
        let options = ClusterOptions {
            insecure_skip_tls_verify: true,
            certificate_authority: Some(PathBuf::from("/etc/ca.pem")),
            ..ClusterOptions::new("lab", ClusterType::Target)
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn embed_requires_readable_ca() {
        let mut options = ClusterOptions {
            embed_ca_data: true,
            ..ClusterOptions::new("lab", ClusterType::Target)
        };
        assert!(options.validate().is_err());

        let dir = TempDir::new().unwrap();
        options.certificate_authority = Some(dir.path().join("missing.pem"));
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("could not read"));

        let ca = dir.path().join("ca.pem");
        fs::write(&ca, "PEM").unwrap();
        options.certificate_authority = Some(ca);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn context_name_or_current() {
        assert!(ContextOptions::default().validate().is_err());
        assert!(ContextOptions::named("lab").validate().is_ok());

        let current = ContextOptions {
            current: true,
            ..ContextOptions::default()
        };
        assert!(current.validate().is_ok());

        let both = ContextOptions {
            current: true,
            ..ContextOptions::named("lab")
        };
        assert!(both.validate().is_err());
    }

    #[test]
    fn context_cluster_reference_is_canonical() {
        let mut options = ContextOptions::named("lab");
        assert_eq!(options.cluster_reference().unwrap(), None);

        options.cluster = Some("lab".to_string());
        assert_eq!(options.cluster_reference().unwrap().as_deref(), Some("lab_target"));

        options.cluster_type = Some("ephemeral".to_string());
        assert_eq!(
            options.cluster_reference().unwrap().as_deref(),
            Some("lab_ephemeral")
        );

        options.cluster_type = Some("bogus".to_string());
        assert!(options.validate().is_err());
    }

    #[test]
    fn token_and_basic_auth_conflict() {
        let options = AuthInfoOptions {
            token: Some("abc".to_string()),
            username: Some("admin".to_string()),
            ..AuthInfoOptions::named("admin")
        };
        assert!(options.validate().is_err());

        let options = AuthInfoOptions {
            token: Some("abc".to_string()),
            username: Some(String::new()),
            ..AuthInfoOptions::named("admin")
        };
        assert!(options.validate().is_ok());
    }

    #[test]
    fn embed_requires_client_certificate() {
        let dir = TempDir::new().unwrap();
        let cert = dir.path().join("client.crt");
        fs::write(&cert, "CERT").unwrap();

        let mut options = AuthInfoOptions {
            embed_cert_data: true,
            ..AuthInfoOptions::named("admin")
        };
        assert!(options.validate().is_err());

        options.client_certificate = Some(cert);
        assert!(options.validate().is_ok());

        options.client_key = Some(dir.path().join("missing.key"));
        assert!(options.validate().is_err());
    }
}
