//! Infrastructure deployment.
//!
//! [`init_infra`] resolves the current context's bundle for the `initinfra`
//! phase and hands its deployable documents to an [`Applier`].

use async_trait::async_trait;
use rackctl_control::{ClusterType, Config};
use rackctl_store::schema::phases;

use crate::document::{labels, Document, DocumentSource};
use crate::error::{OpsError, Result};

/// How documents are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Validate without persisting anything.
    pub dry_run: bool,
    /// Remove previously applied objects missing from this set.
    pub prune: bool,
}

impl ApplyOptions {
    /// Label selector restricting what pruning may remove, if pruning.
    #[must_use]
    pub const fn prune_selector(&self) -> Option<&'static str> {
        if self.prune {
            Some(labels::INITINFRA_PRUNE_SELECTOR)
        } else {
            None
        }
    }
}

/// Applies documents to a cluster.
#[async_trait]
pub trait Applier: Send + Sync {
    /// Apply the documents.
    ///
    /// # Errors
    ///
    /// Returns `OpsError::Apply` if the cluster rejects them.
    async fn apply(&self, documents: &[Document], options: ApplyOptions) -> Result<()>;
}

/// Deploy the base infrastructure of the current context.
///
/// Returns the number of documents applied.
///
/// # Errors
///
/// Returns `OpsError::Config` if the configuration is incomplete,
/// `DocumentsNotFound` if the bundle has nothing to deploy, or the loader or
/// applier error.
pub async fn init_infra<D, A>(
    config: &Config,
    cluster_type: ClusterType,
    bundles: &D,
    applier: &A,
    options: ApplyOptions,
) -> Result<usize>
where
    D: DocumentSource + ?Sized,
    A: Applier + ?Sized,
{
    config.ensure_complete()?;
    let path = config.current_context_entry_point(cluster_type, phases::INITINFRA)?;

    let documents: Vec<Document> = bundles
        .load(&path)
        .await?
        .into_iter()
        .filter(Document::deploys_to_cluster)
        .collect();
    if documents.is_empty() {
        return Err(OpsError::DocumentsNotFound { path });
    }

    tracing::info!(
        path = %path.display(),
        count = documents.len(),
        dry_run = options.dry_run,
        prune = options.prune,
        "Applying initinfra documents"
    );
    applier.apply(&documents, options).await?;
    Ok(documents.len())
}

/// In-memory collaborators for tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};

    use parking_lot::Mutex;

    use super::{async_trait, Applier, ApplyOptions, Document, DocumentSource, OpsError, Result};

    /// Serves bundles registered by path.
    #[derive(Debug, Default)]
    pub struct StaticDocumentSource {
        bundles: BTreeMap<PathBuf, Vec<Document>>,
    }

    impl StaticDocumentSource {
        /// Create an empty source.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Register the bundle served for a path.
        #[must_use]
        pub fn with_bundle(mut self, path: impl Into<PathBuf>, documents: Vec<Document>) -> Self {
            self.bundles.insert(path.into(), documents);
            self
        }
    }

    #[async_trait]
    impl DocumentSource for StaticDocumentSource {
        async fn load(&self, path: &Path) -> Result<Vec<Document>> {
            self.bundles
                .get(path)
                .cloned()
                .ok_or_else(|| OpsError::Io {
                    path: path.to_path_buf(),
                    source: std::io::ErrorKind::NotFound.into(),
                })
        }
    }

    /// Records every apply call.
    #[derive(Debug, Default)]
    pub struct RecordingApplier {
        calls: Mutex<Vec<(Vec<String>, ApplyOptions)>>,
    }

    impl RecordingApplier {
        /// Create an applier with no calls recorded.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Names of the documents and options of each call, in order.
        #[must_use]
        pub fn calls(&self) -> Vec<(Vec<String>, ApplyOptions)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Applier for RecordingApplier {
        async fn apply(&self, documents: &[Document], options: ApplyOptions) -> Result<()> {
            let names = documents.iter().map(|d| d.name().to_string()).collect();
            self.calls.lock().push((names, options));
            Ok(())
        }
    }
}
