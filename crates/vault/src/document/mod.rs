//! Whole-document protection: encryption with integrity metadata, file type and
//! name hygiene, and access auditing.
//!
//! # Module invariants
//!
//! - Rejections (type, name, size) happen before any cryptographic work, so a
//!   rejected upload leaves no partial state.
//! - The digest in [`common::EncryptedFileMetadata`] is always over the
//!   plaintext; verification re-hashes after decryption.
//! - Audit failures are logged and swallowed, never returned.

pub mod naming;
pub mod vault;

pub use naming::{generate_storage_name, sanitize_file_name, validate_type};
pub use vault::{DocumentVault, PreparedDocument, Verification};
