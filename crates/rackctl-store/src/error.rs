//! Error types for the storage layer.

use std::path::PathBuf;

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while reading or writing the backing files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read, written or removed.
    #[error("{}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// The underlying error, unchanged.
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not a valid document.
    #[error("failed to parse {}: {message}", path.display())]
    Parse {
        /// The file being decoded.
        path: PathBuf,
        /// The decoder message.
        message: String,
    },

    /// A document could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored repository violates a structural constraint.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl StoreError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error reports a file that does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Structural constraint violations in a manifest repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The repository has no URL.
    #[error("repository spec requires url")]
    RequiresUrl,

    /// The authentication type is not supported.
    #[error("invalid auth type {auth_type:?}, allowed types: {}", crate::schema::auth_types::ALL.join(","))]
    AuthTypeNotSupported {
        /// The rejected type.
        auth_type: String,
    },

    /// Options were set that the authentication type does not accept.
    #[error("can not use {} options with auth type {auth_type}", forbidden.join(", "))]
    IncompatibleAuthOptions {
        /// The offending option names.
        forbidden: Vec<String>,
        /// The declared authentication type.
        auth_type: String,
    },

    /// More than one of commit hash, branch and tag was set.
    #[error("checkout options are mutually exclusive, use either: commit-hash, branch or tag")]
    MutuallyExclusiveCheckout,
}
