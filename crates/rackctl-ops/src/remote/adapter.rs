//! The set of hosts an operation acts on.

use std::fmt;

use rackctl_control::Config;
use rackctl_store::ManagementConfiguration;

use super::client::ClientFactory;
use super::inventory::{HostInventory, HostSelector, HostSpec};
use super::{ManagementClient, PowerState};
use crate::error::Result;

/// A selected host with its connected client.
pub struct RemoteHost {
    spec: HostSpec,
    client: Box<dyn ManagementClient>,
}

impl RemoteHost {
    /// The host's connection details.
    #[must_use]
    pub const fn spec(&self) -> &HostSpec {
        &self.spec
    }

    /// The host's client.
    #[must_use]
    pub fn client(&self) -> &dyn ManagementClient {
        self.client.as_ref()
    }
}

impl fmt::Debug for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteHost")
            .field("spec", &self.spec)
            .field("node_id", &self.client.node_id())
            .finish()
    }
}

/// Connected clients for every selected host.
#[derive(Debug)]
pub struct Adapter {
    management: ManagementConfiguration,
    hosts: Vec<RemoteHost>,
}

impl Adapter {
    /// Resolve the current context's management configuration, select hosts
    /// and connect to each.
    ///
    /// A host matched by more than one selector is connected once.
    ///
    /// # Errors
    ///
    /// Returns the configuration lookup error, the selection error, or the
    /// connection error of the first host that fails.
    pub fn new(
        config: &Config,
        inventory: &dyn HostInventory,
        factory: &dyn ClientFactory,
        selectors: &[HostSelector],
    ) -> Result<Self> {
        let management = config.current_context_management_config()?.clone();

        let mut hosts: Vec<RemoteHost> = Vec::new();
        for selector in selectors {
            for spec in inventory.select(selector)? {
                if hosts.iter().any(|h| h.spec.name == spec.name) {
                    continue;
                }
                let client = factory.connect(&management, &spec)?;
                hosts.push(RemoteHost { spec, client });
            }
        }

        tracing::info!(
            management_type = %management.management_type,
            hosts = hosts.len(),
            "Created management adapter"
        );
        Ok(Self { management, hosts })
    }

    /// The management settings the clients were built with.
    #[must_use]
    pub const fn management(&self) -> &ManagementConfiguration {
        &self.management
    }

    /// The selected hosts, in selection order.
    #[must_use]
    pub fn hosts(&self) -> &[RemoteHost] {
        &self.hosts
    }

    /// Reboot every host. Returns the host names, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first host that fails.
    pub async fn reboot(&self) -> Result<Vec<String>> {
        let mut done = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            host.client.reboot_system().await?;
            tracing::info!(host = %host.spec.name, "Rebooted remote host");
            done.push(host.spec.name.clone());
        }
        Ok(done)
    }

    /// Power every host off. Returns the host names, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first host that fails.
    pub async fn power_off(&self) -> Result<Vec<String>> {
        let mut done = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            host.client.system_power_off().await?;
            tracing::info!(host = %host.spec.name, "Powered off remote host");
            done.push(host.spec.name.clone());
        }
        Ok(done)
    }

    /// Power state of every host.
    ///
    /// # Errors
    ///
    /// Stops at the first host that cannot be queried.
    pub async fn power_status(&self) -> Result<Vec<(String, PowerState)>> {
        let mut states = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let state = host.client.system_power_status().await?;
            states.push((host.spec.name.clone(), state));
        }
        Ok(states)
    }
}
