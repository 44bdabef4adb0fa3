//! File layout, document kinds and built-in defaults.
//!
//! This module defines the constants shared by the stores and their callers.

/// Locations of the backing files.
pub mod files {
    /// Directory under the home directory holding both files.
    pub const CONFIG_DIR: &str = ".rackctl";

    /// File name of the profile store.
    pub const PROFILE_FILE: &str = "config";

    /// File name of the credential store.
    pub const KUBECONFIG_FILE: &str = "kubeconfig";
}

/// Environment variables overriding file locations.
pub mod env {
    /// Overrides the profile file location.
    pub const CONFIG: &str = "RACKCTL_CONFIG";

    /// Overrides the credential file location.
    pub const KUBECONFIG: &str = "RACKCTL_KUBECONFIG";
}

/// `apiVersion` / `kind` headers written to each document.
pub mod kinds {
    /// Profile document API version.
    pub const PROFILE_API_VERSION: &str = "rackctl.io/v1alpha1";

    /// Profile document kind.
    pub const PROFILE_KIND: &str = "Config";

    /// Credential document API version.
    pub const KUBECONFIG_API_VERSION: &str = "v1";

    /// Credential document kind.
    pub const KUBECONFIG_KIND: &str = "Config";
}

/// Records synthesized when a backing file does not exist yet.
pub mod defaults {
    /// Name of the default context and of the cluster it points at.
    pub const CONTEXT: &str = "default_target";

    /// API server endpoint of the default cluster.
    pub const CLUSTER_SERVER: &str = "https://172.17.0.1:6443";

    /// Name of the default credential entry.
    pub const AUTH_INFO: &str = "admin";

    /// Username of the default credential entry.
    pub const USERNAME: &str = "rackctl-admin";

    /// Name of the default manifest.
    pub const MANIFEST: &str = "default";

    /// Name of the primary repository of the default manifest.
    pub const REPOSITORY: &str = "primary";

    /// Checkout target of the default manifest.
    pub const TARGET_PATH: &str = "/tmp/default";

    /// Name of the default bootstrap-info record.
    pub const BOOTSTRAP_INFO: &str = "default";

    /// Name of the default management configuration.
    pub const MANAGEMENT_CONFIGURATION: &str = "default";

    /// Out-of-band client type of the default management configuration.
    pub const MANAGEMENT_TYPE: &str = "redfish";
}

/// Repository authentication types.
pub mod auth_types {
    /// Private key authentication.
    pub const SSH_KEY: &str = "ssh-key";

    /// SSH password authentication.
    pub const SSH_PASS: &str = "ssh-pass";

    /// HTTP basic authentication.
    pub const HTTP_BASIC: &str = "http-basic";

    /// Every supported type.
    pub const ALL: [&str; 3] = [SSH_KEY, SSH_PASS, HTTP_BASIC];
}

/// Deployment phases, used as the last component of a bundle entry point.
pub mod phases {
    /// Base infrastructure phase.
    pub const INITINFRA: &str = "initinfra";
}
