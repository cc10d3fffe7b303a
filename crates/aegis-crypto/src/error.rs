//! Crypto error types.

use thiserror::Error;

/// Errors from field encryption, decryption, and key resolution.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The configured secret could not be resolved. Fatal at startup in
    /// production mode.
    #[error("key resolution failed: secret {name} unavailable")]
    KeyResolution {
        /// Name of the secret that was requested.
        name: String,
    },

    /// The resolved secret is not valid 256-bit key material.
    #[error("invalid key material: {reason}")]
    InvalidKeyMaterial {
        /// Why the material was rejected.
        reason: String,
    },

    /// The secret source itself failed (network, permissions, ...).
    #[error("secret source error: {0}")]
    SecretSource(String),

    /// Encryption failed. Fails the individual call.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Tampered, truncated, or corrupted ciphertext. Surfaced as a
    /// data-integrity error, never coerced to a null value.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The token's version tag names an algorithm this build does not know.
    #[error("unknown ciphertext version: {version}")]
    UnknownVersion {
        /// The version tag found in the token.
        version: u32,
    },

    /// The token does not have the `version:iv:tag:ciphertext` shape.
    #[error("malformed ciphertext token: {reason}")]
    MalformedToken {
        /// What part of the token failed to parse.
        reason: String,
    },
}

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
