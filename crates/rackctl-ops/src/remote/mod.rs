//! Out-of-band management of bare metal hosts.
//!
//! A [`ManagementClient`] talks to one host's BMC. A [`ClientFactory`] builds
//! clients for the management type named in the configuration, and an
//! [`Adapter`] holds one connected client per selected host.

pub mod adapter;
pub mod client;
pub mod direct;
pub mod inventory;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

pub use adapter::{Adapter, RemoteHost};
pub use client::{ClientFactory, ClientRegistry};
pub use direct::remote_direct;
pub use inventory::{DocumentInventory, HostInventory, HostSelector, HostSpec};

/// Power state reported by a BMC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerState {
    /// Powered on.
    On,
    /// Powered off.
    Off,
    /// Transitioning to on.
    PoweringOn,
    /// Transitioning to off.
    PoweringOff,
    /// A state this client does not model.
    Unknown(String),
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("On"),
            Self::Off => f.write_str("Off"),
            Self::PoweringOn => f.write_str("PoweringOn"),
            Self::PoweringOff => f.write_str("PoweringOff"),
            Self::Unknown(state) => f.write_str(state),
        }
    }
}

impl From<&str> for PowerState {
    fn from(value: &str) -> Self {
        match value {
            "On" => Self::On,
            "Off" => Self::Off,
            "PoweringOn" => Self::PoweringOn,
            "PoweringOff" => Self::PoweringOff,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Operations an out-of-band client performs against one host.
#[async_trait]
pub trait ManagementClient: Send + Sync {
    /// Identifier of the system on the BMC.
    fn node_id(&self) -> &str;

    /// Restart the system.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Client` if the BMC rejects the request.
    async fn reboot_system(&self) -> Result<()>;

    /// Power the system off.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Client` if the BMC rejects the request.
    async fn system_power_off(&self) -> Result<()>;

    /// Current power state.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Client` if the BMC cannot be queried.
    async fn system_power_status(&self) -> Result<PowerState>;

    /// Make the inserted virtual media the next boot source.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Client` if the BMC rejects the request.
    async fn set_boot_source_by_type(&self) -> Result<()>;

    /// Insert the image at a URL as virtual media.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Client` if the BMC rejects the request.
    async fn set_virtual_media(&self, iso_url: &str) -> Result<()>;
}
