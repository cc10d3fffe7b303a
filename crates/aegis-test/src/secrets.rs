//! An in-memory [`SecretSource`].

use aegis_crypto::{CryptoResult, SecretSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Secret manager double backed by a map.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets
            .lock()
            .expect("secret store lock poisoned")
            .insert(name.into(), value.into());
    }
}

#[async_trait]
impl SecretSource for MemorySecretStore {
    async fn get_secret(&self, name: &str) -> CryptoResult<Option<String>> {
        Ok(self
            .secrets
            .lock()
            .expect("secret store lock poisoned")
            .get(name)
            .cloned())
    }
}
