//! Aegis Crypto - versioned authenticated field encryption.
//!
//! This crate provides:
//! - [`FieldCipher`]: AES-256-GCM encryption of individual sensitive field
//!   values into self-describing `version:iv:tag:ciphertext` tokens
//! - One-way [`mask`] and [`hash`] transforms for display and equality
//!   search
//! - A [`SecretSource`] seam for resolving the data key from a remote
//!   secret manager (production) or a deterministic local source (dev)
//!
//! # Security Model
//!
//! - A fresh random 96-bit IV per encryption: identical plaintexts yield
//!   different tokens (semantic security).
//! - The GCM tag is verified before any plaintext is returned; tampered or
//!   truncated tokens fail with [`CryptoError::DecryptionFailed`], never a
//!   plausible wrong plaintext.
//! - Tokens carry a version tag so future algorithm changes remain
//!   distinguishable; unknown versions are rejected explicitly.
//! - Key material is zeroized on drop and is read-only after
//!   initialization, so concurrent use needs no synchronization.
//!
//! # Example
//!
//! ```
//! use aegis_crypto::FieldCipher;
//!
//! let cipher = FieldCipher::new([7u8; 32]);
//! let token = cipher.encrypt("123-45-6789").unwrap();
//! assert!(token.starts_with("1:"));
//! assert_eq!(cipher.decrypt(&token).unwrap(), "123-45-6789");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod cipher;
mod digest;
mod error;
mod key;

pub use cipher::{FieldCipher, TOKEN_VERSION};
pub use digest::{hash, mask};
pub use error::{CryptoError, CryptoResult};
pub use key::{KeyMode, SecretSource};
