//! [`DocumentVault`]: encrypt documents for storage, decrypt and verify them
//! later, and record who accessed them.

use std::sync::Arc;

use chrono::Utc;
use common::{AccessLogEntry, DocumentRecord, EncryptedFileMetadata, VaultError};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

use super::naming::{sanitize_file_name, validate_type};
use crate::audit::AuditSink;
use crate::crypto::{integrity, SymmetricCipher};

/// Ciphertext plus everything the caller must persist next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDocument {
    pub encrypted: Vec<u8>,
    pub metadata: EncryptedFileMetadata,
    /// Sanitised file name.
    pub file_name: String,
    pub mime_type: String,
}

impl PreparedDocument {
    /// Split into the ciphertext blob and the row to store under `storage_name`.
    pub fn into_record(self, storage_name: impl Into<String>) -> (Vec<u8>, DocumentRecord) {
        let record = DocumentRecord {
            file_name: self.file_name,
            storage_name: storage_name.into(),
            mime_type: self.mime_type,
            is_encrypted: true,
            metadata: self.metadata,
        };
        (self.encrypted, record)
    }
}

/// Decrypted document content, tagged with the outcome of the integrity check.
///
/// Unverified content is still handed back: whether to serve it is the
/// caller's decision, but the caller has to make it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Digest and size match the metadata.
    Verified(Vec<u8>),
    /// Digest or size differ: the stored ciphertext is corrupted or tampered.
    Unverified(Vec<u8>),
}

impl Verification {
    pub fn is_verified(&self) -> bool {
        matches!(self, Verification::Verified(_))
    }

    /// The decrypted bytes regardless of the outcome.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Verification::Verified(b) | Verification::Unverified(b) => b,
        }
    }

    /// The decrypted bytes regardless of the outcome.
    pub fn into_inner(self) -> Vec<u8> {
        match self {
            Verification::Verified(b) | Verification::Unverified(b) => b,
        }
    }

    /// The decrypted bytes only if they verified.
    pub fn into_verified(self) -> Option<Vec<u8>> {
        match self {
            Verification::Verified(b) => Some(b),
            Verification::Unverified(_) => None,
        }
    }
}

/// End-to-end protection of document buffers.
///
/// Cheap to clone; clones share the cipher and the audit sink.
#[derive(Clone)]
pub struct DocumentVault {
    cipher: SymmetricCipher,
    sink: Arc<dyn AuditSink>,
    max_document_bytes: usize,
}

impl DocumentVault {
    pub fn new(cipher: SymmetricCipher, sink: Arc<dyn AuditSink>, max_document_bytes: usize) -> Self {
        Self {
            cipher,
            sink,
            max_document_bytes,
        }
    }

    /// Validate, hash, and encrypt a document for storage.
    ///
    /// Does not write an audit entry: the caller knows who uploaded the
    /// document and should log the upload itself.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidDocument`], before any encryption, if the
    /// file name is blank, the type is not allowed, or the payload exceeds the
    /// configured size limit.
    pub fn prepare_for_storage(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<PreparedDocument, VaultError> {
        if file_name.trim().is_empty() {
            return Err(VaultError::InvalidDocument("file name is empty".into()));
        }
        if !validate_type(mime_type, file_name) {
            return Err(VaultError::InvalidDocument(format!(
                "unsupported file type: {mime_type}"
            )));
        }
        if bytes.len() > self.max_document_bytes {
            return Err(VaultError::InvalidDocument(format!(
                "document is {} bytes; limit is {}",
                bytes.len(),
                self.max_document_bytes
            )));
        }

        let hash = integrity::hash_hex(bytes);
        let sealed = self.cipher.encrypt_buffer(bytes);
        debug!(original_size = bytes.len(), mime_type, "document encrypted");

        Ok(PreparedDocument {
            encrypted: sealed.ciphertext,
            metadata: EncryptedFileMetadata {
                iv: sealed.iv_hex,
                hash,
                original_size: bytes.len() as u64,
                encrypted_at: Utc::now(),
            },
            file_name: sanitize_file_name(file_name),
            mime_type: mime_type.trim().to_ascii_lowercase(),
        })
    }

    /// Decrypt a stored document and check it against its metadata.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decryption`] if the IV is malformed or the
    /// ciphertext does not decrypt. A document that decrypts but fails the
    /// integrity check is not an error; it comes back as
    /// [`Verification::Unverified`].
    pub fn decrypt_and_verify(
        &self,
        encrypted: &[u8],
        metadata: &EncryptedFileMetadata,
    ) -> Result<Verification, VaultError> {
        let plaintext = self
            .cipher
            .decrypt_buffer(encrypted, &metadata.iv)
            .inspect_err(|e| warn!(error = %e, "document failed to decrypt"))?;

        let size_matches = plaintext.len() as u64 == metadata.original_size;
        if size_matches && integrity::verify_hex(&plaintext, &metadata.hash) {
            Ok(Verification::Verified(plaintext))
        } else {
            warn!(
                expected_size = metadata.original_size,
                actual_size = plaintext.len(),
                "document failed integrity verification"
            );
            Ok(Verification::Unverified(plaintext))
        }
    }

    /// Record an access attempt without waiting for the sink.
    ///
    /// The append runs on a spawned Tokio task; the returned handle may be
    /// dropped. Sink failures are logged, never returned. Outside a Tokio
    /// runtime the entry is dropped with a warning and `None` is returned.
    pub fn log_access(&self, entry: AccessLogEntry) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                document_id = %entry.document_id,
                action = %entry.action,
                "no Tokio runtime; access log entry dropped"
            );
            return None;
        };
        let sink = Arc::clone(&self.sink);
        Some(runtime.spawn(async move { append_logged(sink.as_ref(), entry).await }))
    }

    /// Record an access attempt and wait for the sink to accept it.
    ///
    /// Sink failures are logged, never returned.
    pub async fn record_access(&self, entry: AccessLogEntry) {
        append_logged(self.sink.as_ref(), entry).await;
    }

    /// Access history of a document, oldest first.
    ///
    /// Returns an empty list if the sink cannot be read.
    pub async fn access_history(&self, document_id: &str) -> Vec<AccessLogEntry> {
        self.try_access_history(document_id)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, document_id, "failed to read access history");
                Vec::new()
            })
    }

    /// Access history of a document, oldest first, surfacing sink failures.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Audit`] if the sink cannot be read.
    pub async fn try_access_history(
        &self,
        document_id: &str,
    ) -> Result<Vec<AccessLogEntry>, VaultError> {
        let mut entries = self.sink.list_by_document(document_id).await?;
        entries.sort_by_key(|e| e.created_at);
        Ok(entries)
    }
}

async fn append_logged(sink: &dyn AuditSink, entry: AccessLogEntry) {
    let document_id = entry.document_id.clone();
    let action = entry.action;
    if let Err(e) = sink.append(entry).await {
        warn!(
            error = %e,
            document_id = %document_id,
            action = %action,
            "failed to write access log entry"
        );
    }
}
