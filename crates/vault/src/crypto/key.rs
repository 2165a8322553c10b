//! [`SymmetricKey`]: the process key, and the rules for acquiring it.

use common::VaultError;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Fixed key used by development processes that have no `ENCRYPTION_KEY`.
///
/// Data encrypted under it is readable by anyone with this source code, so a
/// production process refuses it.
pub const DEVELOPMENT_KEY: &str = "dev-only-insecure-vault-key-0001";

/// Errors produced while acquiring the key.
#[derive(Debug, Error)]
pub enum KeyError {
    /// No key was configured and the process runs in production.
    #[error("ENCRYPTION_KEY is required in production")]
    Missing,

    /// The configured secret is shorter than [`KEY_LEN`] bytes.
    #[error("ENCRYPTION_KEY must be at least {KEY_LEN} bytes, got {0}")]
    TooShort(usize),

    /// A production process was configured with the public development key.
    #[error("the development key must not be used in production")]
    DevelopmentKeyInProduction,
}

impl From<KeyError> for VaultError {
    fn from(e: KeyError) -> Self {
        VaultError::Configuration(e.to_string())
    }
}

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When dropped, the memory is overwritten with zeroes to shorten the window
/// during which key material lives in RAM.
pub struct SymmetricKey(Box<[u8; KEY_LEN]>);

impl SymmetricKey {
    /// Build a key from a configured secret, keeping its first [`KEY_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::TooShort`] if the secret has fewer than [`KEY_LEN`] bytes.
    pub fn from_secret(secret: &str) -> Result<Self, KeyError> {
        let bytes = secret.as_bytes();
        if bytes.len() < KEY_LEN {
            return Err(KeyError::TooShort(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&bytes[..KEY_LEN]);
        Ok(Self(buf))
    }

    /// Build a key from raw bytes (e.g. material unwrapped by an external KMS).
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Box::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material — not even in debug builds.
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Acquire the process key from configuration.
///
/// A development process without a configured key falls back to
/// [`DEVELOPMENT_KEY`] and emits a warning. A production process never does.
///
/// # Errors
///
/// - [`KeyError::Missing`] if no key is configured in production.
/// - [`KeyError::DevelopmentKeyInProduction`] if production is configured with
///   [`DEVELOPMENT_KEY`].
/// - [`KeyError::TooShort`] if the configured secret is shorter than [`KEY_LEN`].
pub fn acquire(cfg: &Config) -> Result<SymmetricKey, KeyError> {
    let configured = cfg
        .encryption_key
        .as_deref()
        .filter(|k| !k.trim().is_empty());

    match configured {
        Some(secret) => {
            if cfg.is_production() && secret.starts_with(DEVELOPMENT_KEY) {
                return Err(KeyError::DevelopmentKeyInProduction);
            }
            let key = SymmetricKey::from_secret(secret)?;
            info!(profile = ?cfg.app_profile, "encryption key loaded from configuration");
            Ok(key)
        }
        None if cfg.is_production() => Err(KeyError::Missing),
        None => {
            warn!("ENCRYPTION_KEY not set; using the insecure development key");
            SymmetricKey::from_secret(DEVELOPMENT_KEY)
        }
    }
}
