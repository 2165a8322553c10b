//! Caller-facing error type.

use thiserror::Error;

/// Top-level vault error type.
///
/// Every variant carries a message that is safe to surface to callers: it
/// never contains plaintext, ciphertext, or key material.
///
/// Variants map to stable machine-readable codes via [`VaultError::code`]:
/// - [`VaultError::Configuration`] → `configuration_error`
/// - [`VaultError::InvalidDocument`] → `invalid_document`
/// - [`VaultError::Decryption`] → `decryption_failed`
/// - [`VaultError::Audit`] → `audit_unavailable`
#[derive(Debug, Error)]
pub enum VaultError {
    /// Key material is missing, too short, or unfit for the deployment profile.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A document was rejected before any cryptographic work began.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A well-formed envelope or buffer could not be decrypted.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The audit store could not be read or written.
    #[error("audit store unavailable: {0}")]
    Audit(String),
}

impl VaultError {
    /// Returns the stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            VaultError::Configuration(_) => "configuration_error",
            VaultError::InvalidDocument(_) => "invalid_document",
            VaultError::Decryption(_) => "decryption_failed",
            VaultError::Audit(_) => "audit_unavailable",
        }
    }

    /// Returns `true` when the caller's input was refused and nothing was stored
    /// or decrypted.
    pub fn is_rejection(&self) -> bool {
        matches!(self, VaultError::InvalidDocument(_))
    }
}
