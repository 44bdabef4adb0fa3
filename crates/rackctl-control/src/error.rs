//! Error types for the reconciliation engine.
//!
//! This module defines all errors that can occur while loading, reconciling,
//! validating, querying and mutating a configuration.

use std::fmt;
use std::path::PathBuf;

use rackctl_core::IdError;
use rackctl_store::{RepositoryError, StoreError};
use thiserror::Error;

use crate::lifecycle::ConfigState;

/// A result type using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The kind of named record looked up in the profile's modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// A bootstrap-info record.
    BootstrapInfo,
    /// A management-configuration record.
    ManagementConfiguration,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BootstrapInfo => "bootstrap info",
            Self::ManagementConfiguration => "management configuration",
        })
    }
}

/// Errors that can occur in configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required collection or cross-reference is absent.
    #[error("missing configuration: {what}")]
    MissingConfiguration {
        /// Description of the gap.
        what: String,
    },

    /// A field fails a structural constraint.
    #[error("invalid configuration: {what}")]
    InvalidConfiguration {
        /// Description of the violated constraint.
        what: String,
    },

    /// A bootstrap-info or management-configuration name is not defined.
    #[error("{kind} {name:?} not found")]
    NamedLookupNotFound {
        /// What was looked up.
        kind: LookupKind,
        /// The name looked up.
        name: String,
    },

    /// The current manifest lacks its designated primary repository.
    #[error("current context manifest {manifest:?} must have primary repository set")]
    MissingPrimaryRepository {
        /// The manifest without a primary repository.
        manifest: String,
    },

    /// A manifest repository is invalid.
    #[error("repository {name:?}: {source}")]
    InvalidRepository {
        /// The repository name.
        name: String,
        /// The violated constraint.
        #[source]
        source: RepositoryError,
    },

    /// A cluster type string is not recognized.
    #[error(transparent)]
    InvalidClusterType(#[from] IdError),

    /// The requested lifecycle transition is not valid.
    #[error("invalid configuration state: cannot transition from {from:?} to {to:?}")]
    InvalidState {
        /// The current state.
        from: ConfigState,
        /// The requested target state.
        to: ConfigState,
    },

    /// A referenced certificate or key file could not be read.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error, unchanged.
        #[source]
        source: std::io::Error,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ConfigError {
    /// Build a `MissingConfiguration` error.
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingConfiguration { what: what.into() }
    }

    /// Build an `InvalidConfiguration` error.
    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidConfiguration { what: what.into() }
    }

    /// Returns true if the configuration is incomplete rather than wrong.
    #[must_use]
    pub const fn is_missing_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingConfiguration { .. }
                | Self::NamedLookupNotFound { .. }
                | Self::MissingPrimaryRepository { .. }
        )
    }

    /// Returns the process exit code the CLI reports for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingConfiguration { .. }
            | Self::NamedLookupNotFound { .. }
            | Self::MissingPrimaryRepository { .. } => 3,
            Self::InvalidConfiguration { .. }
            | Self::InvalidRepository { .. }
            | Self::InvalidClusterType(_) => 2,
            Self::InvalidState { .. } => 70,
            Self::Io { .. } | Self::Store(_) => 74,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_exit_codes() {
        assert_eq!(ConfigError::missing("clusters").exit_code(), 3);
        assert_eq!(ConfigError::invalid("name").exit_code(), 2);
        assert_eq!(
            ConfigError::InvalidState {
                from: ConfigState::Unloaded,
                to: ConfigState::Persisted,
            }
            .exit_code(),
            70
        );
        assert_eq!(
            ConfigError::Io {
                path: PathBuf::from("/nope"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .exit_code(),
            74
        );
    }

    #[test]
    fn missing_classification() {
        assert!(ConfigError::missing("x").is_missing_configuration());
        assert!(ConfigError::NamedLookupNotFound {
            kind: LookupKind::BootstrapInfo,
            name: "bm".to_string(),
        }
        .is_missing_configuration());
        assert!(!ConfigError::invalid("x").is_missing_configuration());
    }

    #[test]
    fn lookup_message_names_record() {
        let err = ConfigError::NamedLookupNotFound {
            kind: LookupKind::ManagementConfiguration,
            name: "dell".to_string(),
        };
        assert_eq!(err.to_string(), "management configuration \"dell\" not found");
    }
}
