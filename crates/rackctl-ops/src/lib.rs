//! Deployment and out-of-band host management for rackctl.
//!
//! The flows in this crate read resolved values from a reconciled
//! [`rackctl_control::Config`] and drive collaborators expressed as traits:
//!
//! - [`DocumentSource`] loads a document bundle from a path
//! - [`Applier`] applies documents to a cluster
//! - [`HostInventory`] resolves host selectors to BMC details
//! - [`ManagementClient`] performs power and boot actions on one host
//!
//! # Example
//!
//! ```no_run
//! use rackctl_control::{ClusterType, Config};
//! use rackctl_ops::{init_infra, Applier, ApplyOptions, FsDocumentSource};
//! use rackctl_store::FileStore;
//!
//! # async fn example(applier: &dyn Applier) -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileStore::in_dir(std::path::Path::new("/home/ops/.rackctl"));
//! let config = Config::open(&store)?;
//!
//! let options = ApplyOptions { dry_run: true, prune: false };
//! let applied = init_infra(&config, ClusterType::Ephemeral, &FsDocumentSource, applier, options).await?;
//! println!("Applied {applied} documents");
//! # Ok(())
//! # }
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature for in-memory collaborators:
//!
//! ```ignore
//! use rackctl_ops::remote::mock::{ephemeral_config, fake_registry, CallLog, StaticInventory};
//! use rackctl_ops::remote_direct;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ephemeral_config()?;
//! let inventory = StaticInventory::new().with_host("node-01", &["rackctl.io/ephemeral-node=true"]);
//! let log = CallLog::new();
//!
//! remote_direct(&config, &inventory, &fake_registry("redfish", &log)).await?;
//! assert_eq!(log.entries().len(), 3);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod deploy;
pub mod document;
pub mod error;
pub mod remote;

pub use deploy::{init_infra, Applier, ApplyOptions};
pub use document::{parse_documents, Document, DocumentSource, FsDocumentSource};
pub use error::{OpsError, Result};
pub use remote::{
    remote_direct, Adapter, ClientFactory, ClientRegistry, DocumentInventory, HostInventory,
    HostSelector, HostSpec, ManagementClient, PowerState, RemoteHost,
};
