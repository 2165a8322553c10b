//! SHA-256 content digests for detecting corruption or tampering.
//!
//! Digests are stored in the clear next to the ciphertext, so comparison
//! does not need to be constant-time.

use sha2::{Digest, Sha256};

/// Byte length of a SHA-256 digest.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 digest of `data`.
pub fn hash(data: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(data).into()
}

/// Lowercase hex SHA-256 digest of `data`.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}

/// Recompute the digest of `data` and compare it to `expected`.
pub fn verify(data: &[u8], expected: &[u8]) -> bool {
    hash(data).as_slice() == expected
}

/// Like [`verify`], with the expected digest hex-encoded.
///
/// A malformed hex digest never verifies.
pub fn verify_hex(data: &[u8], expected_hex: &str) -> bool {
    match hex::decode(expected_hex) {
        Ok(expected) => verify(data, &expected),
        Err(_) => false,
    }
}
