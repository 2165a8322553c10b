//! Records exchanged between the vault and its callers.
//!
//! These types are what callers persist in their own store: the vault never
//! writes documents or metadata itself. They serialise as camelCase JSON so
//! they sit naturally next to the rest of a caller's row data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Document metadata
// ---------------------------------------------------------------------------

/// Everything needed to decrypt and verify an encrypted document later.
///
/// Produced together with the ciphertext and immutable afterwards. Losing it
/// makes the ciphertext unrecoverable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedFileMetadata {
    /// Hex-encoded 16-byte IV used for the document ciphertext.
    pub iv: String,
    /// Hex-encoded SHA-256 digest of the plaintext.
    pub hash: String,
    /// Plaintext length in bytes.
    pub original_size: u64,
    /// When the document was encrypted.
    pub encrypted_at: DateTime<Utc>,
}

/// The persisted document row: where the ciphertext lives plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Sanitised form of the name the file was uploaded under.
    pub file_name: String,
    /// Unique storage key the ciphertext blob is stored under.
    pub storage_name: String,
    /// Declared MIME type.
    pub mime_type: String,
    /// `false` only for legacy rows written before encryption was enabled.
    pub is_encrypted: bool,
    /// Decryption and verification metadata.
    pub metadata: EncryptedFileMetadata,
}

// ---------------------------------------------------------------------------
// Access audit
// ---------------------------------------------------------------------------

/// Kind of access attempted on a protected document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessAction {
    View,
    Download,
    Upload,
    Delete,
}

impl AccessAction {
    /// Lowercase wire name, as used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessAction::View => "view",
            AccessAction::Download => "download",
            AccessAction::Upload => "upload",
            AccessAction::Delete => "delete",
        }
    }
}

impl std::fmt::Display for AccessAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One access attempt on a protected document, successful or not.
///
/// Entries are append-only: nothing in the vault mutates or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub document_id: String,
    /// `None` for system-initiated access.
    pub user_id: Option<String>,
    pub action: AccessAction,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
    /// Free-form context supplied by the caller.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AccessLogEntry {
    /// Start a successful, system-initiated entry stamped with the current time.
    pub fn new(document_id: impl Into<String>, action: AccessAction) -> Self {
        Self {
            document_id: document_id.into(),
            user_id: None,
            action,
            ip: None,
            user_agent: None,
            success: true,
            error_message: None,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Attach one key/value pair of caller context.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Mark the attempt as failed with a caller-safe reason.
    pub fn failed(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    /// Override the creation timestamp (used when replaying or importing entries).
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_action_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&AccessAction::Download).unwrap(),
            "\"download\""
        );
        let parsed: AccessAction = serde_json::from_str("\"upload\"").unwrap();
        assert_eq!(parsed, AccessAction::Upload);
        assert_eq!(AccessAction::Delete.to_string(), "delete");
    }

    #[test]
    fn entry_builder_defaults_to_system_success() {
        let entry = AccessLogEntry::new("doc-1", AccessAction::View);
        assert!(entry.success);
        assert!(entry.user_id.is_none());
        assert!(entry.error_message.is_none());
        assert!(entry.metadata.is_empty());
    }

    #[test]
    fn failed_entry_carries_reason() {
        let entry = AccessLogEntry::new("doc-1", AccessAction::Download)
            .with_user("user-7")
            .with_ip("203.0.113.9")
            .with_metadata("orderId", json!("ord-42"))
            .failed("integrity check failed");
        assert!(!entry.success);
        assert_eq!(entry.error_message.as_deref(), Some("integrity check failed"));
        assert_eq!(entry.user_id.as_deref(), Some("user-7"));
        assert_eq!(entry.metadata["orderId"], json!("ord-42"));
    }

    #[test]
    fn entry_uses_camel_case_fields() {
        let entry = AccessLogEntry::new("doc-1", AccessAction::Upload).with_user_agent("curl/8");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["documentId"], "doc-1");
        assert_eq!(value["userAgent"], "curl/8");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let meta = EncryptedFileMetadata {
            iv: "00".repeat(16),
            hash: "ab".repeat(32),
            original_size: 10240,
            encrypted_at: Utc::now(),
        };
        let text = serde_json::to_string(&meta).unwrap();
        assert!(text.contains("originalSize"));
        let decoded: EncryptedFileMetadata = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, meta);
    }
}
