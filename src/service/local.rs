//! Registry operations over a [`UidStore`], shared by the HTTP handlers and
//! the in-process [`LocalRegistry`].

use std::sync::Arc;

use tracing::error;

use crate::core::registry::CompletionRegistry;
use crate::error::{RegistryError, StoreError};
use crate::service::store::{MarkOutcome, UidStatus, UidStore};

fn storage_failure(e: StoreError) -> RegistryError {
    error!(error = %e, "Registry store failure");
    RegistryError::Server(e.to_string())
}

/// Credential exists and is unused
pub fn check_uid(store: &dyn UidStore, uid: &str) -> Result<(), RegistryError> {
    if uid.trim().is_empty() {
        return Err(RegistryError::MissingUid);
    }
    match store.status(uid).map_err(storage_failure)? {
        UidStatus::Available => Ok(()),
        UidStatus::Used => Err(RegistryError::AlreadyUsed),
        UidStatus::Unknown => Err(RegistryError::NotFound),
    }
}

/// Idempotent upsert of a completion
pub fn record_uid(store: &dyn UidStore, uid: &str) -> Result<MarkOutcome, RegistryError> {
    if uid.trim().is_empty() {
        return Err(RegistryError::MissingUid);
    }
    store.mark_used(uid).map_err(storage_failure)
}

/// Registry answered directly from a store in this process
#[derive(Clone)]
pub struct LocalRegistry {
    store: Arc<dyn UidStore>,
}

impl LocalRegistry {
    pub fn new(store: Arc<dyn UidStore>) -> Self {
        Self { store }
    }
}

impl CompletionRegistry for LocalRegistry {
    fn validate(&self, uid: &str) -> Result<(), RegistryError> {
        check_uid(self.store.as_ref(), uid)
    }

    fn record_completion(&self, uid: &str) -> Result<(), RegistryError> {
        record_uid(self.store.as_ref(), uid).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::store::{MemoryUidStore, Roster};

    #[test]
    fn test_local_registry_contract() {
        let store = Arc::new(MemoryUidStore::new(Some(Roster::from_uids(["FX-1"]))));
        let registry = LocalRegistry::new(store.clone());

        assert_eq!(registry.validate(""), Err(RegistryError::MissingUid));
        assert_eq!(registry.validate("FX-9"), Err(RegistryError::NotFound));
        assert_eq!(registry.validate("FX-1"), Ok(()));

        assert_eq!(registry.record_completion("FX-1"), Ok(()));
        assert_eq!(registry.record_completion("FX-1"), Ok(()));
        assert_eq!(store.completion_count().unwrap(), 1);
        assert_eq!(registry.validate("FX-1"), Err(RegistryError::AlreadyUsed));
    }
}
