//! [`MemoryAuditSink`]: process-local audit store for tests and single-node tools.

use std::sync::Arc;

use async_trait::async_trait;
use common::AccessLogEntry;
use tokio::sync::RwLock;

use super::sink::{AuditError, AuditSink};

/// In-memory, append-only audit log.
///
/// Clones share the same underlying log.
#[derive(Clone, Debug, Default)]
pub struct MemoryAuditSink {
    entries: Arc<RwLock<Vec<AccessLogEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all documents.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, entry: AccessLogEntry) -> Result<(), AuditError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn list_by_document(&self, document_id: &str) -> Result<Vec<AccessLogEntry>, AuditError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.document_id == document_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AccessAction;

    #[tokio::test]
    async fn initially_empty() {
        let sink = MemoryAuditSink::new();
        assert!(sink.is_empty().await);
        assert!(sink.list_by_document("doc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_only_matching_document() {
        let sink = MemoryAuditSink::new();
        sink.append(AccessLogEntry::new("a", AccessAction::Upload))
            .await
            .unwrap();
        sink.append(AccessLogEntry::new("b", AccessAction::View))
            .await
            .unwrap();
        sink.append(AccessLogEntry::new("a", AccessAction::Download))
            .await
            .unwrap();

        let a = sink.list_by_document("a").await.unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].action, AccessAction::Upload);
        assert_eq!(a[1].action, AccessAction::Download);
        assert_eq!(sink.len().await, 3);
    }

    #[tokio::test]
    async fn clones_share_the_log() {
        let sink = MemoryAuditSink::new();
        let clone = sink.clone();
        clone
            .append(AccessLogEntry::new("a", AccessAction::Delete))
            .await
            .unwrap();
        assert_eq!(sink.len().await, 1);
    }
}
