//! Prelude module - commonly used types for convenient import.
//!
//! Use `use aegis_crypto::prelude::*;` to import all essential types.

pub use crate::cipher::{FieldCipher, TOKEN_VERSION};
pub use crate::digest::{hash, mask};
pub use crate::error::{CryptoError, CryptoResult};
pub use crate::key::{KeyMode, SecretSource};
