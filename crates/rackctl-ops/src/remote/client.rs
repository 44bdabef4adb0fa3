//! Client construction by management type.

use std::collections::BTreeMap;
use std::fmt;

use rackctl_store::ManagementConfiguration;

use super::inventory::HostSpec;
use super::ManagementClient;
use crate::error::{OpsError, Result};

/// Builds a connected client for one host.
pub trait ClientFactory: Send + Sync {
    /// Connect to a host's BMC using the management settings.
    ///
    /// # Errors
    ///
    /// Returns `UnknownManagementType` if no client handles the configured
    /// type, or the client's connection error.
    fn connect(
        &self,
        management: &ManagementConfiguration,
        host: &HostSpec,
    ) -> Result<Box<dyn ManagementClient>>;
}

type Constructor =
    Box<dyn Fn(&ManagementConfiguration, &HostSpec) -> Result<Box<dyn ManagementClient>> + Send + Sync>;

/// A [`ClientFactory`] dispatching on the configured management type.
#[derive(Default)]
pub struct ClientRegistry {
    constructors: BTreeMap<String, Constructor>,
}

impl ClientRegistry {
    /// Create a registry with no client types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor used for a management type.
    #[must_use]
    pub fn register<F>(mut self, management_type: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&ManagementConfiguration, &HostSpec) -> Result<Box<dyn ManagementClient>>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(management_type.into(), Box::new(constructor));
        self
    }

    /// Registered management types, sorted.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("types", &self.types())
            .finish()
    }
}

impl ClientFactory for ClientRegistry {
    fn connect(
        &self,
        management: &ManagementConfiguration,
        host: &HostSpec,
    ) -> Result<Box<dyn ManagementClient>> {
        let constructor = self
            .constructors
            .get(&management.management_type)
            .ok_or_else(|| OpsError::UnknownManagementType(management.management_type.clone()))?;
        tracing::debug!(
            host = %host.name,
            management_type = %management.management_type,
            insecure = management.insecure,
            use_proxy = management.use_proxy,
            "Connecting to BMC"
        );
        constructor(management, host)
    }
}
