//! Canonical cluster identifiers for rackctl.
//!
//! A cluster is known to the profile store by a `{name, type}` pair and to the
//! credential store by a single string. [`ClusterIdentity`] is the join key
//! between the two: its canonical encoding is `<name>_<type>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the cluster name and the cluster type in a canonical name.
pub const CLUSTER_NAME_SEPARATOR: &str = "_";

/// The role a cluster plays in a bare-metal deployment.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClusterType {
    /// The short-lived bootstrap cluster used to provision the target.
    Ephemeral,
    /// The long-lived cluster the site is deployed onto.
    #[default]
    Target,
}

impl ClusterType {
    /// All recognized cluster types, in listing order.
    pub const ALL: [Self; 2] = [Self::Ephemeral, Self::Target];

    /// Return the string form used in files and canonical names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ephemeral => "ephemeral",
            Self::Target => "target",
        }
    }

    /// Return the allowed string forms, for error messages.
    #[must_use]
    pub fn allowed() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl fmt::Debug for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterType({})", self.as_str())
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterType {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| IdError::UnknownClusterType {
                value: s.to_string(),
                allowed: Self::allowed().join(", "),
            })
    }
}

impl TryFrom<String> for ClusterType {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClusterType> for String {
    fn from(t: ClusterType) -> Self {
        t.as_str().to_string()
    }
}

/// The composite identity of a cluster: a free-form name plus its type.
///
/// The canonical string form is `name` + [`CLUSTER_NAME_SEPARATOR`] + `type`.
/// Names may themselves contain the separator; only the trailing segment is
/// ever interpreted as a type.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClusterIdentity {
    name: String,
    cluster_type: ClusterType,
}

impl ClusterIdentity {
    /// Create an identity from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, cluster_type: ClusterType) -> Self {
        Self {
            name: name.into(),
            cluster_type,
        }
    }

    /// Map a raw credential-store cluster name to its identity.
    ///
    /// If the last separator-delimited segment is a recognized cluster type
    /// the name is split there. Otherwise the whole string is the name and the
    /// type defaults to [`ClusterType::Target`].
    ///
    /// Canonicalizing a canonical string returns the identity it encodes.
    #[must_use]
    pub fn canonicalize(raw: &str) -> Self {
        if let Some((name, suffix)) = raw.rsplit_once(CLUSTER_NAME_SEPARATOR) {
            if let Ok(cluster_type) = suffix.parse::<ClusterType>() {
                return Self::new(name, cluster_type);
            }
        }
        Self::new(raw, ClusterType::default())
    }

    /// Return the cluster name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the cluster type.
    #[must_use]
    pub const fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    /// Return true if `raw` is already the canonical encoding of its identity.
    #[must_use]
    pub fn is_canonical(raw: &str) -> bool {
        Self::canonicalize(raw).to_string() == raw
    }
}

impl fmt::Debug for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterIdentity({self})")
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{CLUSTER_NAME_SEPARATOR}{}",
            self.name, self.cluster_type
        )
    }
}

impl From<String> for ClusterIdentity {
    fn from(value: String) -> Self {
        Self::canonicalize(&value)
    }
}

impl From<&str> for ClusterIdentity {
    fn from(value: &str) -> Self {
        Self::canonicalize(value)
    }
}

impl From<ClusterIdentity> for String {
    fn from(id: ClusterIdentity) -> Self {
        id.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The cluster type is not one of the recognized types.
    #[error("unknown cluster type {value:?}: must be one of [{allowed}]")]
    UnknownClusterType {
        /// The rejected value.
        value: String,
        /// The recognized types, comma separated.
        allowed: String,
    },
}
