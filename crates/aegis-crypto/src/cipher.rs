//! The field cipher: AES-256-GCM over individual field values.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use rand::RngCore;
use tracing::debug;

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KeyMaterial, KeyMode, SecretSource};

/// Version tag emitted on every token produced by this build.
pub const TOKEN_VERSION: u32 = 1;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Authenticated encryption of sensitive field values.
///
/// Tokens have the self-describing form `version:iv:tag:ciphertext` with
/// base64 segments and a decimal version. The cipher holds only the data
/// key; it is cheap to share behind an `Arc` and safe for unsynchronized
/// concurrent use.
pub struct FieldCipher {
    key: KeyMaterial,
}

impl FieldCipher {
    /// Build a cipher directly from 256-bit key material. Intended for
    /// tests and tooling; services should go through [`initialize`].
    ///
    /// [`initialize`]: Self::initialize
    #[must_use]
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: KeyMaterial(key),
        }
    }

    /// Resolve the data key and build the cipher.
    ///
    /// Idempotent: calling this twice with the same source and mode yields
    /// ciphers with identical key material. In [`KeyMode::Production`] a
    /// missing or malformed secret is an error the process must treat as
    /// fatal at startup.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyResolution`],
    /// [`CryptoError::InvalidKeyMaterial`], or
    /// [`CryptoError::SecretSource`] when the key cannot be resolved.
    pub async fn initialize(
        source: &dyn SecretSource,
        mode: KeyMode,
    ) -> CryptoResult<Self> {
        let key = KeyMaterial::resolve(source, &mode).await?;
        debug!(mode = mode_kind(&mode), "field cipher initialized");
        Ok(Self { key })
    }

    /// Encrypt a field value into a versioned token.
    ///
    /// A fresh random IV is drawn per call, so encrypting the same value
    /// twice never yields the same token.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] if the AEAD rejects the
    /// input.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key.0));

        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let sealed = cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(format!("AES-256-GCM: {e}")))?;

        // The aead crate appends the tag; split it out so the token keeps
        // the iv/tag/ciphertext segments separately inspectable.
        let split = sealed
            .len()
            .checked_sub(TAG_LEN)
            .ok_or_else(|| CryptoError::EncryptionFailed("output shorter than tag".into()))?;
        let (ct, tag) = sealed.split_at(split);

        Ok(format!(
            "{TOKEN_VERSION}:{}:{}:{}",
            B64.encode(nonce),
            B64.encode(tag),
            B64.encode(ct)
        ))
    }

    /// Decrypt a versioned token back to the field value.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::MalformedToken`] when the token is not four
    ///   `:`-separated segments of valid base64.
    /// - [`CryptoError::UnknownVersion`] for version tags this build does
    ///   not implement.
    /// - [`CryptoError::DecryptionFailed`] when the auth tag does not
    ///   verify (any tampering of any segment).
    pub fn decrypt(&self, token: &str) -> CryptoResult<String> {
        let parts: Vec<&str> = token.split(':').collect();
        let [version, iv_b64, tag_b64, ct_b64] = parts[..] else {
            return Err(CryptoError::MalformedToken {
                reason: format!("expected 4 segments, got {}", parts.len()),
            });
        };

        let version: u32 = version.parse().map_err(|_| CryptoError::MalformedToken {
            reason: format!("non-numeric version tag: {version}"),
        })?;
        if version != TOKEN_VERSION {
            return Err(CryptoError::UnknownVersion { version });
        }

        let nonce = decode_segment(iv_b64, "iv")?;
        let tag = decode_segment(tag_b64, "tag")?;
        let ct = decode_segment(ct_b64, "ciphertext")?;

        if nonce.len() != NONCE_LEN {
            return Err(CryptoError::MalformedToken {
                reason: format!("iv must be {NONCE_LEN} bytes, got {}", nonce.len()),
            });
        }
        if tag.len() != TAG_LEN {
            return Err(CryptoError::MalformedToken {
                reason: format!("tag must be {TAG_LEN} bytes, got {}", tag.len()),
            });
        }

        // Reassemble ciphertext||tag the way the aead crate expects.
        let mut sealed = ct;
        sealed.extend_from_slice(&tag);

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key.0));
        let plain = cipher
            .decrypt(GenericArray::from_slice(&nonce), sealed.as_slice())
            .map_err(|_| {
                CryptoError::DecryptionFailed("auth tag verification failed".into())
            })?;

        String::from_utf8(plain)
            .map_err(|_| CryptoError::DecryptionFailed("plaintext is not valid UTF-8".into()))
    }

    /// Encrypt with null passthrough: `None` stays `None`.
    ///
    /// # Errors
    ///
    /// Same as [`encrypt`](Self::encrypt).
    pub fn encrypt_opt(&self, value: Option<&str>) -> CryptoResult<Option<String>> {
        value.map(|v| self.encrypt(v)).transpose()
    }

    /// Decrypt with null passthrough: `None` stays `None`.
    ///
    /// # Errors
    ///
    /// Same as [`decrypt`](Self::decrypt).
    pub fn decrypt_opt(&self, token: Option<&str>) -> CryptoResult<Option<String>> {
        token.map(|t| self.decrypt(t)).transpose()
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material through Debug.
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

fn decode_segment(segment: &str, what: &str) -> CryptoResult<Vec<u8>> {
    B64.decode(segment).map_err(|e| CryptoError::MalformedToken {
        reason: format!("{what} is not valid base64: {e}"),
    })
}

fn mode_kind(mode: &KeyMode) -> &'static str {
    match mode {
        KeyMode::Production { .. } => "production",
        KeyMode::LocalDev => "local_dev",
    }
}
