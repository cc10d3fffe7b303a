//! Guard error types.

use aegis_core::SecurityError;
use aegis_crypto::CryptoError;
use thiserror::Error;

/// Errors raised while guarding a data operation.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Isolation or context failure. Always propagates — fail closed.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// Field encryption/decryption failure. A decryption failure is a
    /// data-integrity error and is never coerced to a null value.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A model registers encrypted fields but the guard was built without
    /// a cipher.
    #[error("encrypted fields configured for {model} but no field cipher is attached")]
    CipherMissing {
        /// The model whose fields could not be processed.
        model: String,
    },

    /// The operation's args do not have the shape its action requires.
    #[error("invalid operation args: {reason}")]
    InvalidArgs {
        /// What was malformed.
        reason: String,
    },

    /// The external data-access layer failed.
    #[error("data source error: {0}")]
    Source(String),
}

/// Result type for guard operations.
pub type GuardResult<T> = Result<T, GuardError>;
