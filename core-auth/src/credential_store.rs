//! Persistence of the access credential through the host key-value store.

use crate::error::{AuthError, Result};
use crate::types::Credential;
use bridge_traits::KeyValueStore;
use std::sync::Arc;
use tracing::debug;

/// Reads and writes the single session credential under a fixed key.
///
/// Values are never logged; only the key and the presence of a value are.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored credential. An empty stored value counts as none.
    pub async fn load(&self) -> Result<Option<Credential>> {
        let value = self.store.get(&self.key).await.map_err(AuthError::Storage)?;
        let credential = value.map(Credential::from).filter(|c| !c.is_empty());
        debug!(key = %self.key, present = credential.is_some(), "Loaded credential");
        Ok(credential)
    }

    pub async fn save(&self, credential: &Credential) -> Result<()> {
        self.store
            .set(&self.key, credential.as_str())
            .await
            .map_err(AuthError::Storage)?;
        debug!(key = %self.key, "Stored credential");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store
            .remove(&self.key)
            .await
            .map_err(AuthError::Storage)?;
        debug!(key = %self.key, "Cleared credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::MemoryStore;

    #[tokio::test]
    async fn test_save_load_clear() {
        let backing = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(backing.clone(), "accessToken");

        assert_eq!(store.load().await.unwrap(), None);

        store.save(&Credential::new("C1")).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(Credential::new("C1")));
        assert_eq!(
            backing.get("accessToken").await.unwrap(),
            Some("C1".to_string())
        );

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_value_is_no_credential() {
        let backing = Arc::new(MemoryStore::new());
        backing.set("accessToken", "").await.unwrap();

        let store = CredentialStore::new(backing, "accessToken");
        assert_eq!(store.load().await.unwrap(), None);
    }
}
