//! Core types for rackctl.
//!
//! This crate provides the canonical naming scheme shared by every other crate:
//!
//! - **Cluster types**: the closed set of roles a cluster can play
//! - **Cluster identities**: the `{name, type}` key joining the profile and
//!   credential stores, and its `<name>_<type>` string encoding
//!
//! # Example
//!
//! ```
//! use rackctl_core::{ClusterIdentity, ClusterType};
//!
//! // An unsuffixed credential name is given the default type
//! let id = ClusterIdentity::canonicalize("lab");
//! assert_eq!(id.cluster_type(), ClusterType::Target);
//! assert_eq!(id.to_string(), "lab_target");
//!
//! // Canonical names decode back into their parts
//! let id = ClusterIdentity::canonicalize("lab_ephemeral");
//! assert_eq!(id.name(), "lab");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ids;

pub use ids::{ClusterIdentity, ClusterType, IdError, CLUSTER_NAME_SEPARATOR};
