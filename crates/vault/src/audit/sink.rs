//! The [`AuditSink`] capability the document layer writes through.

use async_trait::async_trait;
use common::{AccessLogEntry, VaultError};
use thiserror::Error;

/// Errors produced by audit sinks.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store could not be read or written.
    #[error("audit store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A stored entry could not be encoded or decoded.
    #[error("audit entry serialisation failed: {0}")]
    Serde(#[from] serde_json::Error),

    /// The sink is temporarily unable to accept or serve entries.
    #[error("audit store unavailable: {0}")]
    Unavailable(String),
}

impl From<AuditError> for VaultError {
    fn from(e: AuditError) -> Self {
        VaultError::Audit(e.to_string())
    }
}

/// Durable, append-only store of [`AccessLogEntry`] values.
///
/// Implementations must be safe to share across tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: AccessLogEntry) -> Result<(), AuditError>;

    /// All entries recorded for `document_id`, in insertion order.
    async fn list_by_document(&self, document_id: &str) -> Result<Vec<AccessLogEntry>, AuditError>;
}
