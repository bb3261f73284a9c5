//! Cryptographic utilities shared across tokenauth crates
//!
//! Provides a timing-safe equality check for secrets of arbitrary length.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compare two secrets in constant time.
///
/// Both inputs are reduced to SHA-256 digests first, so the comparison
/// always runs over 32 bytes and neither the position of the first
/// mismatching byte nor a length difference changes the work performed.
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    let a_digest = Sha256::digest(a);
    let b_digest = Sha256::digest(b);

    a_digest.as_slice().ct_eq(b_digest.as_slice()).into()
}
