//! Remote direct boot of the ephemeral host.

use rackctl_control::{Config, ConfigError};

use super::adapter::Adapter;
use super::client::ClientFactory;
use super::inventory::{HostInventory, HostSelector};
use crate::document::labels;
use crate::error::{OpsError, Result};

/// Boot the ephemeral host from the bootstrap ISO.
///
/// Inserts the configured ISO as virtual media, makes it the boot source
/// and reboots. Returns the node id of the host.
///
/// # Errors
///
/// Returns `OpsError::Config` if the current cluster has no bootstrap record
/// or that record has no remote direct options, `EphemeralHostCount` unless
/// exactly one host carries the ephemeral label, `MissingBootstrapOption` if
/// no ISO URL is set, or the first client error.
pub async fn remote_direct(
    config: &Config,
    inventory: &dyn HostInventory,
    factory: &dyn ClientFactory,
) -> Result<String> {
    let bootstrap = config.current_context_bootstrap_info()?;
    let remote = bootstrap.remote_direct.as_ref().ok_or_else(|| {
        ConfigError::missing("RemoteDirect options not defined in bootstrap config")
    })?;

    let adapter = Adapter::new(
        config,
        inventory,
        factory,
        &[HostSelector::ByLabel(
            labels::EPHEMERAL_HOST_SELECTOR.to_string(),
        )],
    )?;
    let [host] = adapter.hosts() else {
        return Err(OpsError::EphemeralHostCount {
            found: adapter.hosts().len(),
        });
    };
    tracing::debug!(host = %host.spec().name, bmc = %host.spec().bmc_address, "Found ephemeral host");

    if remote.iso_url.is_empty() {
        return Err(OpsError::MissingBootstrapOption {
            what: "isoURL".to_string(),
        });
    }

    let client = host.client();
    client.set_virtual_media(&remote.iso_url).await?;
    tracing::debug!(iso_url = %remote.iso_url, "Loaded virtual media");
    client.set_boot_source_by_type().await?;
    client.reboot_system().await?;
    tracing::info!(host = %host.spec().name, "Restarted ephemeral host");

    Ok(client.node_id().to_string())
}
