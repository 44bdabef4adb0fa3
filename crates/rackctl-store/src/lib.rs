//! Storage layer for rackctl.
//!
//! This crate owns the two persisted documents and their on-disk format:
//!
//! - the profile store (`$HOME/.rackctl/config`): clusters by name and type,
//!   contexts, manifests and bootstrap/management records
//! - the credential store (`$HOME/.rackctl/kubeconfig`): a standard
//!   kubeconfig holding endpoints and credentials
//!
//! It does not interpret either document; reconciliation lives in
//! `rackctl-control`.
//!
//! # Example
//!
//! ```no_run
//! use rackctl_store::{FileStore, Store};
//!
//! let store = FileStore::in_dir(std::path::Path::new("/tmp/rackctl"));
//! let profile = store.read_profile().unwrap().unwrap_or_default();
//! println!("{} manifests", profile.manifests.len());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod files;
pub mod kubeconfig;
pub mod memory;
pub mod schema;
pub mod types;

pub use error::{RepositoryError, Result, StoreError};
pub use files::FileStore;
pub use kubeconfig::{KubeAuthInfo, KubeCluster, KubeContext, Kubeconfig};
pub use secrecy::SecretString;
pub use memory::MemoryStore;
pub use types::{
    AuthInfoProfile, Bootstrap, Builder, ClusterGroup, ClusterProfile, Container, ContextProfile,
    ManagementConfiguration, Manifest, Modules, Profile, RemoteDirect, RepoAuth, RepoCheckout,
    Repository,
};

/// The storage trait over the two persisted documents.
///
/// Reads return `None` when a document has never been written. This trait
/// abstracts the storage layer, allowing for different implementations
/// (e.g., files, in-memory for testing).
pub trait Store: Send + Sync {
    /// Read the profile store.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or decoded.
    fn read_profile(&self) -> Result<Option<Profile>>;

    /// Replace the profile store.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    fn write_profile(&self, profile: &Profile) -> Result<()>;

    /// Read the credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read or decoded.
    fn read_kubeconfig(&self) -> Result<Option<Kubeconfig>>;

    /// Replace the credential store.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be encoded or written.
    fn write_kubeconfig(&self, kubeconfig: &Kubeconfig) -> Result<()>;

    /// Remove the profile document. The credential store is left alone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the document does not exist or cannot be
    /// removed.
    fn remove_profile(&self) -> Result<()>;

    /// Human-readable location, for log and error messages.
    fn location(&self) -> String;
}
