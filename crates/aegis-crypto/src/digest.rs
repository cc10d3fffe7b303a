//! One-way transforms: display masking and searchable digests.

use sha2::{Digest, Sha256};

/// Mask a sensitive value for display, keeping only the last
/// `visible_suffix` characters.
///
/// Non-invertible by construction; this is a display transform for roles
/// not authorized to see full values, distinct from encryption.
///
/// ```
/// assert_eq!(aegis_crypto::mask("123-45-6789", 4), "*******6789");
/// assert_eq!(aegis_crypto::mask("ab", 4), "ab");
/// ```
#[must_use]
pub fn mask(value: &str, visible_suffix: usize) -> String {
    let chars: Vec<char> = value.chars().collect();
    let hidden = chars.len().saturating_sub(visible_suffix);
    let mut out = "*".repeat(hidden);
    out.extend(&chars[hidden..]);
    out
}

/// SHA-256 hex digest of a value.
///
/// Enables equality search (e.g. dedup by email) without plaintext
/// recovery. Deterministic: the same input always hashes identically.
#[must_use]
pub fn hash(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}
