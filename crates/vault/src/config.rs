//! Configuration loading and validation for the vault.
//!
//! All values are read from environment variables once at startup. The key
//! itself is not checked here; [`crate::crypto::key::acquire`] enforces the
//! key rules on first use so that a production process without a key fails
//! before it encrypts anything.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Deployment profile the process runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Local and test deployments; may fall back to the development key.
    #[default]
    Development,
    /// Live deployments; a real key is mandatory.
    Production,
}

/// Validated vault configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Secret the 256-bit key is taken from (at least 32 characters).
    #[serde(default)]
    pub encryption_key: Option<String>,

    /// Deployment profile.
    #[serde(default)]
    pub app_profile: Profile,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Characters left visible at the end of a masked value.
    #[serde(default = "default_mask_visible_chars")]
    pub mask_visible_chars: usize,

    /// Largest document accepted for encryption, in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,

    /// JSON-lines file the `vault` binary appends access entries to.
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_mask_visible_chars() -> usize {
    4
}
fn default_max_document_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_audit_log_path() -> String {
    "vault-audit.jsonl".into()
}

impl Default for Config {
    /// Development configuration without a key.
    fn default() -> Self {
        Self {
            encryption_key: None,
            app_profile: Profile::default(),
            log_level: default_log_level(),
            mask_visible_chars: default_mask_visible_chars(),
            max_document_bytes: default_max_document_bytes(),
            audit_log_path: default_audit_log_path(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("app_profile", &self.app_profile)
            .field("log_level", &self.log_level)
            .field("mask_visible_chars", &self.mask_visible_chars)
            .field("max_document_bytes", &self.max_document_bytes)
            .field("audit_log_path", &self.audit_log_path)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable cannot be parsed or fails validation.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Returns `true` when running under the production profile.
    pub fn is_production(&self) -> bool {
        self.app_profile == Profile::Production
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            anyhow::bail!("LOG_LEVEL must not be empty");
        }
        if self.mask_visible_chars == 0 {
            anyhow::bail!("MASK_VISIBLE_CHARS must be > 0");
        }
        if self.max_document_bytes == 0 {
            anyhow::bail!("MAX_DOCUMENT_BYTES must be > 0");
        }
        if self.audit_log_path.trim().is_empty() {
            anyhow::bail!("AUDIT_LOG_PATH must not be empty");
        }
        Ok(())
    }
}
