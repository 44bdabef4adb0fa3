//! In-memory management clients for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use rackctl_control::{ClusterOptions, ClusterType, Config, ContextOptions};
use rackctl_store::{Kubeconfig, Profile};

use super::client::ClientRegistry;
use super::inventory::{HostInventory, HostSelector, HostSpec};
use super::{ManagementClient, PowerState};
use crate::error::{OpsError, Result};

/// Calls made against fake clients, as `"<node> <call>"` entries.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, in call order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn push(&self, node: &str, call: &str) {
        self.0.lock().push(format!("{node} {call}"));
    }
}

/// A client that records calls and reports a fixed power state.
#[derive(Debug)]
pub struct FakeClient {
    node_id: String,
    log: CallLog,
    power: Mutex<PowerState>,
    failing: Option<String>,
}

impl FakeClient {
    /// Create a powered-on client with its own log.
    #[must_use]
    pub fn new(node_id: &str) -> Self {
        Self::with_log(node_id, CallLog::new())
    }

    /// Create a powered-on client writing to a shared log.
    #[must_use]
    pub fn with_log(node_id: &str, log: CallLog) -> Self {
        Self {
            node_id: node_id.to_string(),
            log,
            power: Mutex::new(PowerState::On),
            failing: None,
        }
    }

    /// Make one call fail with a client error.
    #[must_use]
    pub fn failing(mut self, call: &str) -> Self {
        self.failing = Some(call.to_string());
        self
    }

    fn record(&self, call: &str) -> Result<()> {
        if self.failing.as_deref() == Some(call) {
            return Err(OpsError::client(&self.node_id, format!("{call} refused")));
        }
        self.log.push(&self.node_id, call);
        Ok(())
    }
}

#[async_trait]
impl ManagementClient for FakeClient {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    async fn reboot_system(&self) -> Result<()> {
        self.record("reboot")?;
        *self.power.lock() = PowerState::On;
        Ok(())
    }

    async fn system_power_off(&self) -> Result<()> {
        self.record("power-off")?;
        *self.power.lock() = PowerState::Off;
        Ok(())
    }

    async fn system_power_status(&self) -> Result<PowerState> {
        self.record("power-status")?;
        Ok(self.power.lock().clone())
    }

    async fn set_boot_source_by_type(&self) -> Result<()> {
        self.record("boot-source")
    }

    async fn set_virtual_media(&self, iso_url: &str) -> Result<()> {
        self.record(&format!("virtual-media {iso_url}"))
    }
}

/// A registry whose clients for `management_type` write to the log.
#[must_use]
pub fn fake_registry(management_type: &str, log: &CallLog) -> ClientRegistry {
    let log = log.clone();
    ClientRegistry::new().register(management_type, move |_, host: &HostSpec| {
        Ok(Box::new(FakeClient::with_log(&host.name, log.clone())) as Box<dyn ManagementClient>)
    })
}

/// An inventory serving fixed hosts.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    hosts: Vec<(HostSpec, Vec<String>)>,
}

impl StaticInventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host with `key=value` labels.
    #[must_use]
    pub fn with_host(mut self, name: &str, labels: &[&str]) -> Self {
        let spec = HostSpec {
            name: name.to_string(),
            bmc_address: format!("redfish+https://{name}.bmc/redfish/v1/Systems/1"),
            username: "admin".to_string(),
            password: "admin".to_string(),
        };
        self.hosts
            .push((spec, labels.iter().map(ToString::to_string).collect()));
        self
    }
}

impl HostInventory for StaticInventory {
    fn select(&self, selector: &HostSelector) -> Result<Vec<HostSpec>> {
        let hosts: Vec<HostSpec> = self
            .hosts
            .iter()
            .filter(|(spec, labels)| match selector {
                HostSelector::ByName(name) => &spec.name == name,
                HostSelector::ByLabel(label) => labels.contains(label),
            })
            .map(|(spec, _)| spec.clone())
            .collect();
        if hosts.is_empty() && matches!(selector, HostSelector::ByName(_)) {
            return Err(OpsError::HostNotFound {
                selector: selector.to_string(),
            });
        }
        Ok(hosts)
    }
}

/// A reconciled configuration whose current context `boot` points at the
/// ephemeral cluster `lab`, which uses the `default` bootstrap and management
/// records.
///
/// # Errors
///
/// Returns the configuration error if any step is rejected.
pub fn ephemeral_config() -> Result<Config> {
    ephemeral_config_with(Profile::default())
}

/// As [`ephemeral_config`], starting from the given profile.
///
/// # Errors
///
/// Returns the configuration error if any step is rejected.
pub fn ephemeral_config_with(profile: Profile) -> Result<Config> {
    let mut config = Config::from_documents(profile, Kubeconfig::with_defaults());
    config.reconcile()?;
    config.add_cluster(&ClusterOptions {
        bootstrap_info: Some("default".to_string()),
        management_configuration: Some("default".to_string()),
        ..ClusterOptions::new("lab", ClusterType::Ephemeral)
    })?;
    config.set_context(&ContextOptions {
        cluster: Some("lab_ephemeral".to_string()),
        auth_info: Some("admin".to_string()),
        manifest: Some("default".to_string()),
        ..ContextOptions::named("boot")
    })?;
    config.use_context("boot")?;
    Ok(config)
}
