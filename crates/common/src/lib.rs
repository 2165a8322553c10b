//! Data model and errors shared between the vault library, its binary, and callers.

pub mod error;
pub mod protocol;

pub use error::VaultError;
pub use protocol::{AccessAction, AccessLogEntry, DocumentRecord, EncryptedFileMetadata};
