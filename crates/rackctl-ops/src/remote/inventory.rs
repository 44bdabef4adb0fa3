//! Host selection.
//!
//! Hosts are described by `BareMetalHost` documents. The BMC address comes
//! from `spec.bmc.address`; the credentials come from the `Secret` named by
//! `spec.bmc.credentialsName`, whose `data` fields are base64.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::document::{labels, Document};
use crate::error::{OpsError, Result};

/// Which hosts an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSelector {
    /// The host whose document has this name.
    ByName(String),
    /// Every host whose labels match this selector.
    ByLabel(String),
}

impl fmt::Display for HostSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByName(name) => write!(f, "name {name:?}"),
            Self::ByLabel(selector) => write!(f, "label selector {selector:?}"),
        }
    }
}

/// Connection details of one host's BMC.
#[derive(Clone, PartialEq, Eq)]
pub struct HostSpec {
    /// Host document name.
    pub name: String,
    /// BMC address, as given in the host document.
    pub bmc_address: String,
    /// BMC username.
    pub username: String,
    /// BMC password.
    pub password: String,
}

impl fmt::Debug for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostSpec")
            .field("name", &self.name)
            .field("bmc_address", &self.bmc_address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves selectors to hosts.
pub trait HostInventory: Send + Sync {
    /// The hosts matching a selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns `HostNotFound` when a name selector matches nothing, or
    /// `Document` when a host document is malformed.
    fn select(&self, selector: &HostSelector) -> Result<Vec<HostSpec>>;
}

/// An inventory over a loaded document bundle.
#[derive(Debug, Clone, Default)]
pub struct DocumentInventory {
    documents: Vec<Document>,
}

impl DocumentInventory {
    /// Create an inventory over the documents.
    #[must_use]
    pub const fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    fn hosts(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(|d| d.kind() == labels::BARE_METAL_HOST_KIND)
    }

    fn secret_value(&self, secret: &str, key: &str) -> Result<String> {
        let document = self
            .documents
            .iter()
            .find(|d| d.kind() == labels::SECRET_KIND && d.name() == secret)
            .ok_or_else(|| OpsError::Document(format!("secret {secret:?} not found")))?;
        let encoded = document
            .get_str(&["data", key])
            .ok_or_else(|| OpsError::Document(format!("secret {secret:?} has no {key}")))?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| OpsError::Document(format!("secret {secret:?} {key}: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| OpsError::Document(format!("secret {secret:?} {key}: {e}")))
    }

    fn host_spec(&self, host: &Document) -> Result<HostSpec> {
        let name = host.name();
        let bmc_address = host
            .get_str(&["spec", "bmc", "address"])
            .ok_or_else(|| OpsError::Document(format!("host {name:?} has no BMC address")))?;
        let secret = host
            .get_str(&["spec", "bmc", "credentialsName"])
            .ok_or_else(|| OpsError::Document(format!("host {name:?} has no BMC credentials")))?;

        Ok(HostSpec {
            name: name.to_string(),
            bmc_address: bmc_address.to_string(),
            username: self.secret_value(secret, "username")?,
            password: self.secret_value(secret, "password")?,
        })
    }
}

impl HostInventory for DocumentInventory {
    fn select(&self, selector: &HostSelector) -> Result<Vec<HostSpec>> {
        let hosts = match selector {
            HostSelector::ByName(name) => {
                let host = self
                    .hosts()
                    .find(|d| d.name() == name)
                    .ok_or_else(|| OpsError::HostNotFound {
                        selector: selector.to_string(),
                    })?;
                vec![self.host_spec(host)?]
            }
            HostSelector::ByLabel(label) => self
                .hosts()
                .filter(|d| d.matches_labels(label))
                .map(|d| self.host_spec(d))
                .collect::<Result<Vec<_>>>()?,
        };
        tracing::debug!(%selector, count = hosts.len(), "Selected hosts");
        Ok(hosts)
    }
}
