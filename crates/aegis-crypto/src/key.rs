//! Data-key resolution.
//!
//! The 256-bit field-encryption key comes from a remote secret manager in
//! production or a deterministic local derivation in development. The
//! secret manager is an external collaborator behind the [`SecretSource`]
//! trait; it is consulted only at cipher initialization.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// External secret manager seam. Consulted only during
/// [`FieldCipher::initialize`](crate::FieldCipher::initialize).
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Fetch a named secret, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SecretSource`] when the backing store fails.
    async fn get_secret(&self, name: &str) -> CryptoResult<Option<String>>;
}

/// Where the data key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMode {
    /// Resolve a hex-encoded 256-bit key from the secret source. A missing
    /// or malformed secret is fatal: production must not start without a
    /// real key.
    Production {
        /// Secret name to request.
        secret_name: String,
    },
    /// Derive a deterministic key from a fixed development phrase. Never
    /// used in production; exists so local stacks work without a secret
    /// manager.
    LocalDev,
}

/// 256-bit key material, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct KeyMaterial(pub(crate) [u8; 32]);

impl KeyMaterial {
    /// Resolve key material according to `mode`.
    pub(crate) async fn resolve(
        source: &dyn SecretSource,
        mode: &KeyMode,
    ) -> CryptoResult<Self> {
        match mode {
            KeyMode::Production { secret_name } => {
                let raw = source
                    .get_secret(secret_name)
                    .await?
                    .ok_or_else(|| CryptoError::KeyResolution {
                        name: secret_name.clone(),
                    })?;
                Self::from_hex(raw.trim())
            },
            KeyMode::LocalDev => Ok(Self::derive_dev()),
        }
    }

    fn from_hex(raw: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(raw).map_err(|e| CryptoError::InvalidKeyMaterial {
            reason: format!("not valid hex: {e}"),
        })?;
        let arr: [u8; 32] =
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| CryptoError::InvalidKeyMaterial {
                    reason: format!("expected 32 bytes, got {}", v.len()),
                })?;
        Ok(Self(arr))
    }

    /// Deterministic development key. Stable across restarts so local data
    /// written yesterday still decrypts today.
    fn derive_dev() -> Self {
        let digest = Sha256::digest(b"aegis-local-dev-field-key");
        Self(digest.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<String, String>);

    #[async_trait]
    impl SecretSource for MapSource {
        async fn get_secret(&self, name: &str) -> CryptoResult<Option<String>> {
            Ok(self.0.get(name).cloned())
        }
    }

    #[tokio::test]
    async fn production_resolves_hex_key() {
        let key = "ab".repeat(32);
        let source = MapSource(HashMap::from([("fk".to_string(), key)]));
        let mode = KeyMode::Production {
            secret_name: "fk".to_string(),
        };
        let material = KeyMaterial::resolve(&source, &mode).await.unwrap();
        assert_eq!(material.0, [0xab; 32]);
    }

    #[tokio::test]
    async fn production_missing_secret_is_fatal() {
        let source = MapSource(HashMap::new());
        let mode = KeyMode::Production {
            secret_name: "fk".to_string(),
        };
        let err = KeyMaterial::resolve(&source, &mode).await.unwrap_err();
        assert!(matches!(err, CryptoError::KeyResolution { .. }));
    }

    #[tokio::test]
    async fn production_rejects_short_key() {
        let source = MapSource(HashMap::from([("fk".to_string(), "abcd".to_string())]));
        let mode = KeyMode::Production {
            secret_name: "fk".to_string(),
        };
        let err = KeyMaterial::resolve(&source, &mode).await.unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyMaterial { .. }));
    }

    #[tokio::test]
    async fn dev_key_is_stable() {
        let source = MapSource(HashMap::new());
        let a = KeyMaterial::resolve(&source, &KeyMode::LocalDev).await.unwrap();
        let b = KeyMaterial::resolve(&source, &KeyMode::LocalDev).await.unwrap();
        assert_eq!(a.0, b.0);
    }
}
