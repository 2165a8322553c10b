//! Encryption and integrity for PII at rest.
//!
//! Four components, composed bottom-up:
//!
//! - [`crypto::SymmetricCipher`]: AES-256-CBC over strings and buffers.
//! - [`crypto::integrity`]: SHA-256 digests for post-decryption checks.
//! - [`field::FieldProtector`]: encrypt, decrypt, and mask PII columns.
//! - [`document::DocumentVault`]: encrypt documents with integrity metadata,
//!   validate their type and name, and audit every access through an
//!   [`audit::AuditSink`].
//!
//! [`Vault`] wires them together from a [`Config`].

pub mod audit;
pub mod config;
pub mod crypto;
pub mod document;
pub mod field;
pub mod telemetry;

use std::sync::Arc;

use common::VaultError;

pub use config::{Config, Profile};

use audit::AuditSink;
use crypto::SymmetricCipher;
use document::DocumentVault;
use field::FieldProtector;

/// The composed vault: one key, shared by the field and document layers.
#[derive(Clone)]
pub struct Vault {
    pub cipher: SymmetricCipher,
    pub fields: FieldProtector,
    pub documents: DocumentVault,
}

impl Vault {
    /// Acquire the key from `cfg` and build every component around it.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] if the key cannot be acquired,
    /// e.g. a production process with no `ENCRYPTION_KEY`.
    pub fn from_config(cfg: &Config, sink: Arc<dyn AuditSink>) -> Result<Self, VaultError> {
        let key = crypto::key::acquire(cfg)?;
        let cipher = SymmetricCipher::new(key);
        Ok(Self {
            fields: FieldProtector::new(cipher.clone(), cfg.mask_visible_chars),
            documents: DocumentVault::new(cipher.clone(), sink, cfg.max_document_bytes),
            cipher,
        })
    }
}
