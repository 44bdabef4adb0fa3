//! In-memory storage implementation, for tests and dry runs.

use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::kubeconfig::Kubeconfig;
use crate::types::Profile;
use crate::Store;

#[derive(Debug, Default)]
struct Inner {
    profile: Option<Profile>,
    kubeconfig: Option<Kubeconfig>,
    writes: usize,
}

/// Storage held in memory. Counts writes so callers can observe persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with both documents.
    #[must_use]
    pub fn with_documents(profile: Profile, kubeconfig: Kubeconfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                profile: Some(profile),
                kubeconfig: Some(kubeconfig),
                writes: 0,
            }),
        }
    }

    /// Number of document writes performed so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    /// The stored profile, if any.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.inner.lock().profile.clone()
    }

    /// The stored kubeconfig, if any.
    #[must_use]
    pub fn kubeconfig(&self) -> Option<Kubeconfig> {
        self.inner.lock().kubeconfig.clone()
    }
}

impl Store for MemoryStore {
    fn read_profile(&self) -> Result<Option<Profile>> {
        Ok(self.inner.lock().profile.clone())
    }

    fn write_profile(&self, profile: &Profile) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.profile = Some(profile.clone());
        inner.writes += 1;
        Ok(())
    }

    fn read_kubeconfig(&self) -> Result<Option<Kubeconfig>> {
        Ok(self.inner.lock().kubeconfig.clone())
    }

    fn write_kubeconfig(&self, kubeconfig: &Kubeconfig) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.kubeconfig = Some(kubeconfig.clone());
        inner.writes += 1;
        Ok(())
    }

    fn remove_profile(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.profile.take().is_none() {
            return Err(StoreError::io(
                self.location(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_counted() {
        let store = MemoryStore::new();
        assert!(store.read_profile().unwrap().is_none());

        store.write_profile(&Profile::default()).unwrap();
        store.write_kubeconfig(&Kubeconfig::new()).unwrap();
        assert_eq!(store.writes(), 2);
        assert!(store.profile().is_some());

        store.remove_profile().unwrap();
        assert!(store.profile().is_none());
        assert!(store.kubeconfig().is_some());
        assert!(store.remove_profile().unwrap_err().is_not_found());
    }
}
