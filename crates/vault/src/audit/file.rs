//! [`JsonlAuditSink`]: append-only JSON-lines audit file.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use common::AccessLogEntry;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::warn;

use super::sink::{AuditError, AuditSink};

/// Audit sink that appends one JSON object per line to a file.
///
/// Appends from clones of the same sink are serialised so lines never
/// interleave. Listing reads the whole file; this sink suits operator tooling
/// and small deployments, not high-volume audit trails.
#[derive(Clone, Debug)]
pub struct JsonlAuditSink {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn append(&self, entry: AccessLogEntry) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_path())
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list_by_document(&self, document_id: &str) -> Result<Vec<AccessLogEntry>, AuditError> {
        let text = match fs::read_to_string(self.path.as_path()).await {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            // A torn append must not hide the rest of the trail.
            let entry: AccessLogEntry = match serde_json::from_str(line) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        error = %e,
                        line = index + 1,
                        path = %self.path.display(),
                        "skipping unreadable audit line"
                    );
                    continue;
                }
            };
            if entry.document_id == document_id {
                out.push(entry);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AccessAction;

    #[tokio::test]
    async fn missing_file_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlAuditSink::new(dir.path().join("audit.jsonl"));
        assert!(sink.list_by_document("doc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlAuditSink::new(dir.path().join("audit.jsonl"));
        sink.append(AccessLogEntry::new("doc-1", AccessAction::Upload).with_user("u1"))
            .await
            .unwrap();
        sink.append(AccessLogEntry::new("doc-2", AccessAction::View))
            .await
            .unwrap();
        sink.append(AccessLogEntry::new("doc-1", AccessAction::Download).failed("integrity"))
            .await
            .unwrap();

        let entries = sink.list_by_document("doc-1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id.as_deref(), Some("u1"));
        assert!(!entries[1].success);

        let text = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlAuditSink::new(dir.path().join("audit.jsonl"));
        let mut tasks = Vec::new();
        for i in 0..20 {
            let sink = sink.clone();
            tasks.push(tokio::spawn(async move {
                sink.append(AccessLogEntry::new("doc", AccessAction::View).with_user(format!("u{i}")))
                    .await
            }));
        }
        for t in tasks {
            t.await.unwrap().unwrap();
        }
        assert_eq!(sink.list_by_document("doc").await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn torn_line_does_not_hide_other_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = JsonlAuditSink::new(&path);
        sink.append(AccessLogEntry::new("doc-A", AccessAction::Upload))
            .await
            .unwrap();

        let torn = serde_json::to_string(&AccessLogEntry::new("doc-B", AccessAction::View)).unwrap();
        let mut text = std::fs::read_to_string(&path).unwrap();
        text.push_str(&torn[..torn.len() / 2]);
        text.push('\n');
        std::fs::write(&path, text).unwrap();

        sink.append(AccessLogEntry::new("doc-A", AccessAction::Download))
            .await
            .unwrap();

        let entries = sink.list_by_document("doc-A").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AccessAction::Upload);
        assert_eq!(entries[1].action, AccessAction::Download);
        assert!(sink.list_by_document("doc-B").await.unwrap().is_empty());
    }
}
