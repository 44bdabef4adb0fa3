//! YAML document bundles.
//!
//! A bundle is every document found under a directory. Documents are kept as
//! untyped YAML values; the accessors below read the few metadata fields the
//! deployment and host flows select on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{OpsError, Result};

/// Well-known labels and kinds.
pub mod labels {
    /// Documents labelled `false` here are not applied to the cluster.
    pub const DEPLOY_K8S: &str = "rackctl.io/deploy-k8s";
    /// Selects the host that boots the ephemeral cluster.
    pub const EPHEMERAL_HOST_SELECTOR: &str = "rackctl.io/ephemeral-node=true";
    /// Selects what pruning may remove during the initinfra phase.
    pub const INITINFRA_PRUNE_SELECTOR: &str = "rackctl.io/stage=initinfra";
    /// Kind of a bare metal host document.
    pub const BARE_METAL_HOST_KIND: &str = "BareMetalHost";
    /// Kind of a secret document.
    pub const SECRET_KIND: &str = "Secret";
}

/// One YAML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    value: Value,
}

impl Document {
    /// Wrap a decoded YAML value.
    #[must_use]
    pub const fn new(value: Value) -> Self {
        Self { value }
    }

    /// The whole document.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Follow a path of mapping keys.
    #[must_use]
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.value, |value, key| value.get(*key))
    }

    /// Follow a path of mapping keys to a string.
    #[must_use]
    pub fn get_str(&self, path: &[&str]) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// The `kind` field, or empty.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.get_str(&["kind"]).unwrap_or_default()
    }

    /// The `metadata.name` field, or empty.
    #[must_use]
    pub fn name(&self) -> &str {
        self.get_str(&["metadata", "name"]).unwrap_or_default()
    }

    /// The string-valued `metadata.labels`.
    #[must_use]
    pub fn labels(&self) -> BTreeMap<&str, &str> {
        self.get(&["metadata", "labels"])
            .and_then(Value::as_mapping)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?, v.as_str()?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns true if the labels satisfy a selector of comma-separated
    /// `key=value`, `key!=value` or bare `key` terms.
    #[must_use]
    pub fn matches_labels(&self, selector: &str) -> bool {
        let labels = self.labels();
        selector
            .split(',')
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .all(|term| {
                if let Some((key, value)) = term.split_once("!=") {
                    labels.get(key.trim()) != Some(&value.trim())
                } else if let Some((key, value)) = term.split_once('=') {
                    labels.get(key.trim()) == Some(&value.trim())
                } else {
                    labels.contains_key(term)
                }
            })
    }

    /// Returns true unless the document opts out of cluster deployment.
    #[must_use]
    pub fn deploys_to_cluster(&self) -> bool {
        self.labels().get(labels::DEPLOY_K8S) != Some(&"false")
    }
}

/// Decode every document of a multi-document YAML stream. Empty documents
/// are skipped.
///
/// # Errors
///
/// Returns `OpsError::Document` if the stream is not valid YAML.
pub fn parse_documents(text: &str) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|e| OpsError::Document(e.to_string()))?;
        if !value.is_null() {
            documents.push(Document::new(value));
        }
    }
    Ok(documents)
}

/// Loads the bundle rooted at a path.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load every document under the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be read or decoded.
    async fn load(&self, path: &Path) -> Result<Vec<Document>>;
}

/// Reads `.yaml` and `.yml` files under a directory, recursively, in path
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentSource;

impl FsDocumentSource {
    async fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| OpsError::Io { path, source }
        };

        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(io(&dir))?;
            while let Some(entry) = entries.next_entry().await.map_err(io(&dir))? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(io(&path))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml" | "yml")
                ) {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn load(&self, path: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for file in Self::collect_files(path).await? {
            let text = tokio::fs::read_to_string(&file)
                .await
                .map_err(|source| OpsError::Io {
                    path: file.clone(),
                    source,
                })?;
            documents.extend(parse_documents(&text)?);
        }
        tracing::debug!(path = %path.display(), count = documents.len(), "Loaded document bundle");
        Ok(documents)
    }
}
