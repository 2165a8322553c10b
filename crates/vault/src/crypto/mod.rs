//! AES-256-CBC encryption primitives and SHA-256 integrity checks.
//!
//! This module is intentionally free of document, field, and audit concerns.
//! It provides the low-level operations the field and document layers build on.
//!
//! # Envelope format
//!
//! ```text
//! <hex(iv)>:<hex(ciphertext)>
//! ```
//!
//! The IV is 16 random bytes drawn per call. `:` never occurs in hex, which
//! lets [`is_encrypted`] tell stored envelopes from legacy plaintext.

pub mod cipher;
pub mod integrity;
pub mod key;

pub use cipher::{is_encrypted, CipherError, SealedBuffer, SymmetricCipher, IV_LEN};
pub use key::{SymmetricKey, KEY_LEN};
