//! `vault` — operator binary entry point.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from environment variables.
//! 3. Initialise structured logging.
//! 4. Acquire the key and build the [`Vault`] around a JSON-lines audit sink.
//! 5. Run the requested command.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{AccessAction, AccessLogEntry, DocumentRecord};
use serde_json::json;
use tracing::{info, warn};

use vault::{
    audit::JsonlAuditSink,
    document::{generate_storage_name, Verification},
    field::mask_value,
    telemetry, Config, Vault,
};

#[derive(Debug, Parser)]
#[command(name = "vault", version, about = "Encrypt, verify, and audit PII at rest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Encrypt a document and write `<storage-name>.enc` plus `<storage-name>.json`.
    Seal {
        input: PathBuf,
        /// Declared MIME type of the document.
        #[arg(long)]
        mime: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// User the upload is attributed to in the audit log.
        #[arg(long)]
        user: Option<String>,
    },
    /// Decrypt a sealed document and verify its integrity.
    Open {
        /// The `<storage-name>.json` record written by `seal`.
        record: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        user: Option<String>,
        /// Write the content even if the integrity check fails.
        #[arg(long)]
        allow_unverified: bool,
    },
    /// Encrypt one field value and print its envelope.
    EncryptField { value: String },
    /// Decrypt one envelope (plaintext passes through unchanged).
    DecryptField { value: String },
    /// Print the masked form of a value, decrypting it first if needed.
    Mask {
        value: String,
        #[arg(long)]
        visible: Option<usize>,
    },
    /// Print the access history of a document as JSON lines.
    History { document_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        profile = ?cfg.app_profile,
        "vault starting"
    );

    // -----------------------------------------------------------------------
    // 4. Vault
    // -----------------------------------------------------------------------
    let sink = JsonlAuditSink::new(&cfg.audit_log_path);
    let vault = Vault::from_config(&cfg, Arc::new(sink)).context("failed to acquire encryption key")?;

    // -----------------------------------------------------------------------
    // 5. Command
    // -----------------------------------------------------------------------
    match cli.command {
        Command::Seal {
            input,
            mime,
            out_dir,
            user,
        } => seal(&vault, &input, &mime, &out_dir, user).await,
        Command::Open {
            record,
            output,
            user,
            allow_unverified,
        } => open(&vault, &record, &output, user, allow_unverified).await,
        Command::EncryptField { value } => {
            println!("{}", vault.cipher.encrypt(&value));
            Ok(())
        }
        Command::DecryptField { value } => {
            println!("{}", vault.cipher.decrypt(&value)?);
            Ok(())
        }
        Command::Mask { value, visible } => {
            let plain = vault.cipher.decrypt(&value)?;
            println!("{}", mask_value(&plain, visible.unwrap_or(cfg.mask_visible_chars)));
            Ok(())
        }
        Command::History { document_id } => {
            for entry in vault.documents.try_access_history(&document_id).await? {
                println!("{}", serde_json::to_string(&entry)?);
            }
            Ok(())
        }
    }
}

async fn seal(
    vault: &Vault,
    input: &Path,
    mime: &str,
    out_dir: &Path,
    user: Option<String>,
) -> Result<()> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("input path has no file name")?;

    let prepared = vault.documents.prepare_for_storage(&bytes, &file_name, mime)?;
    let storage_name = generate_storage_name(&file_name);
    let (blob, record) = prepared.into_record(storage_name.clone());

    let record_path = write_sealed(out_dir, &blob, &record).await?;

    let mut entry = AccessLogEntry::new(&storage_name, AccessAction::Upload)
        .with_metadata("originalSize", json!(record.metadata.original_size));
    if let Some(user) = user {
        entry = entry.with_user(user);
    }
    vault.documents.record_access(entry).await;

    info!(storage_name = %storage_name, "document sealed");
    println!("{}", record_path.display());
    Ok(())
}

/// Write `<storage-name>.enc` and its `<storage-name>.json` record.
///
/// The blob is removed again if the record cannot be written: ciphertext
/// without its metadata can never be decrypted.
async fn write_sealed(out_dir: &Path, blob: &[u8], record: &DocumentRecord) -> Result<PathBuf> {
    let blob_path = out_dir.join(format!("{}.enc", record.storage_name));
    let record_path = out_dir.join(format!("{}.json", record.storage_name));
    let record_json = serde_json::to_vec_pretty(record)?;

    tokio::fs::write(&blob_path, blob)
        .await
        .with_context(|| format!("failed to write {}", blob_path.display()))?;
    if let Err(e) = tokio::fs::write(&record_path, &record_json).await {
        if let Err(cleanup) = tokio::fs::remove_file(&blob_path).await {
            warn!(error = %cleanup, path = %blob_path.display(), "failed to remove orphaned blob");
        }
        return Err(e).with_context(|| format!("failed to write {}", record_path.display()));
    }
    Ok(record_path)
}

async fn open(
    vault: &Vault,
    record_path: &Path,
    output: &Path,
    user: Option<String>,
    allow_unverified: bool,
) -> Result<()> {
    let text = tokio::fs::read_to_string(record_path)
        .await
        .with_context(|| format!("failed to read {}", record_path.display()))?;
    let record: DocumentRecord = serde_json::from_str(&text).context("invalid document record")?;
    let blob_path = record_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}.enc", record.storage_name));
    let blob = tokio::fs::read(&blob_path)
        .await
        .with_context(|| format!("failed to read {}", blob_path.display()))?;

    let mut entry = AccessLogEntry::new(&record.storage_name, AccessAction::Download);
    if let Some(user) = user {
        entry = entry.with_user(user);
    }

    let verification = match vault.documents.decrypt_and_verify(&blob, &record.metadata) {
        Ok(v) => v,
        Err(e) => {
            vault.documents.record_access(entry.failed(e.code())).await;
            return Err(e.into());
        }
    };

    let verified = verification.is_verified();
    let entry = entry.with_metadata("verified", json!(verified));
    let bytes = match verification {
        Verification::Verified(bytes) => bytes,
        Verification::Unverified(bytes) if allow_unverified => bytes,
        Verification::Unverified(_) => {
            vault
                .documents
                .record_access(entry.failed("integrity check failed"))
                .await;
            anyhow::bail!("{} failed integrity verification", record.storage_name);
        }
    };

    tokio::fs::write(output, &bytes)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    vault.documents.record_access(entry).await;

    info!(storage_name = %record.storage_name, verified, "document opened");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::EncryptedFileMetadata;

    fn record(storage_name: &str) -> DocumentRecord {
        DocumentRecord {
            file_name: "scan.pdf".into(),
            storage_name: storage_name.into(),
            mime_type: "application/pdf".into(),
            is_encrypted: true,
            metadata: EncryptedFileMetadata {
                iv: "00".repeat(16),
                hash: "ab".repeat(32),
                original_size: 3,
                encrypted_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn writes_blob_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sealed(dir.path(), b"ct!", &record("scan_1_abcdef12.pdf"))
            .await
            .unwrap();
        assert!(path.exists());
        assert!(dir.path().join("scan_1_abcdef12.pdf.enc").exists());
    }

    #[tokio::test]
    async fn failed_record_write_removes_blob() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the record's place makes the record write fail.
        std::fs::create_dir(dir.path().join("scan_1_abcdef12.pdf.json")).unwrap();

        let result = write_sealed(dir.path(), b"ct!", &record("scan_1_abcdef12.pdf")).await;
        assert!(result.is_err());
        assert!(!dir.path().join("scan_1_abcdef12.pdf.enc").exists());
    }
}
