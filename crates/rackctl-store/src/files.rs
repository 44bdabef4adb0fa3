//! File-backed storage implementation.
//!
//! This module provides the `FileStore` implementation of the `Store` trait:
//! one YAML file for the profile store and one for the credential store.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::kubeconfig::Kubeconfig;
use crate::schema::files;
use crate::types::Profile;
use crate::Store;

/// Storage backed by a profile file and a kubeconfig file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    profile_path: PathBuf,
    kubeconfig_path: PathBuf,
}

impl FileStore {
    /// Create a store over the given files. Nothing is read until requested.
    #[must_use]
    pub fn new(profile_path: impl Into<PathBuf>, kubeconfig_path: impl Into<PathBuf>) -> Self {
        Self {
            profile_path: profile_path.into(),
            kubeconfig_path: kubeconfig_path.into(),
        }
    }

    /// Create a store over both files inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(files::PROFILE_FILE), dir.join(files::KUBECONFIG_FILE))
    }

    /// The default configuration directory, `$HOME/.rackctl`.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(files::CONFIG_DIR))
    }

    /// Path of the profile file.
    #[must_use]
    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    /// Path of the kubeconfig file.
    #[must_use]
    pub fn kubeconfig_path(&self) -> &Path {
        &self.kubeconfig_path
    }

    fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        // An empty file decodes to the empty document
        let source = if contents.trim().is_empty() {
            "{}"
        } else {
            contents.as_str()
        };
        serde_yaml::from_str(source)
            .map(Some)
            .map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn write_yaml<T: Serialize>(path: &Path, value: &T, private: bool) -> Result<()> {
        let yaml =
            serde_yaml::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        fs::write(path, yaml).map_err(|e| StoreError::io(path, e))?;
        if private {
            restrict_permissions(path)?;
        }

        tracing::debug!(path = %path.display(), "Wrote store file");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| StoreError::io(path, e))
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

impl Store for FileStore {
    fn read_profile(&self) -> Result<Option<Profile>> {
        Self::read_yaml(&self.profile_path)
    }

    fn write_profile(&self, profile: &Profile) -> Result<()> {
        Self::write_yaml(&self.profile_path, profile, false)
    }

    fn read_kubeconfig(&self) -> Result<Option<Kubeconfig>> {
        Self::read_yaml(&self.kubeconfig_path)
    }

    fn write_kubeconfig(&self, kubeconfig: &Kubeconfig) -> Result<()> {
        Self::write_yaml(&self.kubeconfig_path, kubeconfig, true)
    }

    fn remove_profile(&self) -> Result<()> {
        fs::remove_file(&self.profile_path).map_err(|e| StoreError::io(&self.profile_path, e))?;
        tracing::info!(path = %self.profile_path.display(), "Removed profile file");
        Ok(())
    }

    fn location(&self) -> String {
        format!(
            "{} + {}",
            self.profile_path.display(),
            self.kubeconfig_path.display()
        )
    }
}
