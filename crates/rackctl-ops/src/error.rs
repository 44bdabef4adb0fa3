//! Error types for the operations crate.

use std::path::PathBuf;

use rackctl_control::ConfigError;
use thiserror::Error;

/// Errors that can occur while deploying documents or managing hosts.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Configuration lookup or validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The document bundle at a path selected nothing to apply.
    #[error("no documents found in {}", path.display())]
    DocumentsNotFound {
        /// The bundle path.
        path: PathBuf,
    },

    /// A document file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A document could not be decoded.
    #[error("invalid document: {0}")]
    Document(String),

    /// The management configuration names a type with no registered client.
    #[error("unknown management type: {0}")]
    UnknownManagementType(String),

    /// A bootstrap option required by the operation is unset.
    #[error("missing bootstrap option: {what}")]
    MissingBootstrapOption {
        /// The option name.
        what: String,
    },

    /// Remote direct needs exactly one ephemeral host.
    #[error("expected exactly one ephemeral host, found {found}")]
    EphemeralHostCount {
        /// Number of hosts matched.
        found: usize,
    },

    /// No host matched a selector.
    #[error("no host matches {selector}")]
    HostNotFound {
        /// The selector, rendered.
        selector: String,
    },

    /// An out-of-band management call failed.
    #[error("host {host}: {message}")]
    Client {
        /// The host the call was made against.
        host: String,
        /// Client-provided description.
        message: String,
    },

    /// Applying documents to the cluster failed.
    #[error("apply failed: {0}")]
    Apply(String),
}

impl OpsError {
    /// Build a `Client` error.
    pub fn client(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Client {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Check if retrying the same call may succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Client { .. } | Self::Apply(_))
    }
}

/// A specialized Result type for operations.
pub type Result<T> = std::result::Result<T, OpsError>;
