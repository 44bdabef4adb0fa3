//! Configuration engine for rackctl.
//!
//! This crate owns the rules that keep the profile and the kubeconfig in
//! agreement. A [`Config`] handle is loaded from a [`rackctl_store::Store`],
//! reconciled, queried and mutated, and persisted back.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    CLI / operations                  │
//! └──────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                        Config                        │
//! │  ┌────────────┐ ┌────────────┐ ┌──────────────────┐  │
//! │  │ Reconcile  │ │ Accessors  │ │ Lifecycle        │  │
//! │  │ passes     │ │ Mutators   │ │ State machine    │  │
//! │  └────────────┘ └────────────┘ └──────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//!                 ┌─────────────────────┐
//!                 │ Store (file / mem)  │
//!                 └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use rackctl_control::{ClusterOptions, Config};
//! use rackctl_core::ClusterType;
//! use rackctl_store::FileStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = FileStore::default_dir().ok_or("no home directory")?;
//! let store = FileStore::in_dir(&dir);
//! let mut config = Config::open(&store)?;
//!
//! let options = ClusterOptions {
//!     server: Some("https://10.23.25.101:6443".to_string()),
//!     ..ClusterOptions::new("lab", ClusterType::Ephemeral)
//! };
//! config.set_cluster(&options)?;
//! config.persist(&store)?;
//! # Ok(())
//! # }
//! ```
//!
//! # State Machine
//!
//! - `Unloaded` → `Loaded`
//! - `Loaded` → `Reconciled`
//! - `Reconciled` → `Reconciled` (mutation) or `Persisted`
//! - `Persisted` → `Reconciled` (mutation) or `Persisted`
//!
//! See the [`lifecycle`] module for transition validation helpers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod lifecycle;
mod mutate;
pub mod reconcile;
pub mod types;
pub mod validate;
pub mod view;

pub use config::Config;
pub use error::{ConfigError, LookupKind, Result};
pub use lifecycle::ConfigState;
pub use reconcile::ReconcileReport;
pub use types::{AuthInfoOptions, ClusterOptions, ContextOptions};
pub use view::{AuthInfoView, ClusterView, ContextView};

// Re-export commonly used types from dependencies for convenience
pub use rackctl_core::{ClusterIdentity, ClusterType};
