//! AES-256-CBC encryption of strings and byte buffers under one key.
//!
//! **No MAC.** CBC ciphertext is malleable; documents are protected against
//! tampering by the plaintext digest in their metadata, and field envelopes
//! rely on padding failure to surface most corruption. Every call draws a
//! fresh IV, so identical plaintext never yields identical output.

use std::sync::Arc;

use cbc::cipher::{
    block_padding::Pkcs7, consts::U32, generic_array::GenericArray, BlockDecryptMut,
    BlockEncryptMut, KeyIvInit,
};
use common::VaultError;
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::warn;

use super::key::SymmetricKey;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Byte length of a CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// Character separating the IV from the ciphertext in an envelope.
pub const SEPARATOR: char = ':';

/// Errors produced by the cipher layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The IV is not [`IV_LEN`] bytes of valid hex.
    #[error("invalid IV: expected {IV_LEN} hex-encoded bytes")]
    InvalidIv,

    /// The ciphertext segment is not valid hex.
    #[error("ciphertext is not valid hex")]
    InvalidHex,

    /// The ciphertext is empty or not a whole number of blocks.
    #[error("ciphertext truncated: {0} bytes is not a positive multiple of {IV_LEN}")]
    Truncated(usize),

    /// Padding check failed: the key is wrong or the ciphertext is corrupted.
    #[error("bad padding (wrong key or corrupted ciphertext)")]
    Padding,

    /// The decrypted bytes of a string envelope are not UTF-8.
    #[error("decrypted value is not valid UTF-8")]
    InvalidUtf8,
}

impl From<CipherError> for VaultError {
    fn from(e: CipherError) -> Self {
        VaultError::Decryption(e.to_string())
    }
}

/// Output of [`SymmetricCipher::encrypt_buffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBuffer {
    /// Raw ciphertext bytes.
    pub ciphertext: Vec<u8>,
    /// Hex-encoded IV, stored next to the ciphertext.
    pub iv_hex: String,
}

/// Returns `true` if `value` has the shape of an envelope.
///
/// This is a format check only: it splits on [`SEPARATOR`] into exactly two
/// hex segments, the first decoding to [`IV_LEN`] bytes. It says nothing
/// about whether the value decrypts under the current key.
pub fn is_encrypted(value: &str) -> bool {
    split_envelope(value).is_some()
}

fn split_envelope(value: &str) -> Option<([u8; IV_LEN], &str)> {
    let (iv_hex, ct_hex) = value.split_once(SEPARATOR)?;
    // PKCS#7 always yields at least one whole block.
    if ct_hex.is_empty() || ct_hex.len() % (IV_LEN * 2) != 0 || !is_hex(ct_hex) {
        return None;
    }
    let iv = decode_iv(iv_hex).ok()?;
    Some((iv, ct_hex))
}

fn is_hex(s: &str) -> bool {
    s.len() % 2 == 0 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn decode_iv(iv_hex: &str) -> Result<[u8; IV_LEN], CipherError> {
    let bytes = hex::decode(iv_hex).map_err(|_| CipherError::InvalidIv)?;
    bytes.try_into().map_err(|_| CipherError::InvalidIv)
}

fn random_iv() -> [u8; IV_LEN] {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);
    iv
}

/// Encrypts and decrypts strings and buffers under a single [`SymmetricKey`].
///
/// Cheap to clone: the key is shared behind an `Arc` and never mutated, so
/// one cipher can serve any number of concurrent callers.
#[derive(Clone, Debug)]
pub struct SymmetricCipher {
    key: Arc<SymmetricKey>,
}

impl SymmetricCipher {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key: Arc::new(key) }
    }

    /// Encrypt a string into an envelope.
    ///
    /// The empty string is returned unchanged.
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return String::new();
        }
        let sealed = self.encrypt_buffer(plaintext.as_bytes());
        format!("{}{SEPARATOR}{}", sealed.iv_hex, hex::encode(sealed.ciphertext))
    }

    /// Decrypt an envelope back to its string.
    ///
    /// A value that is not an envelope (see [`is_encrypted`]) is returned
    /// unchanged, so callers migrating from plaintext storage may decrypt every
    /// stored value unconditionally.
    ///
    /// # Errors
    ///
    /// Returns a [`CipherError`] if the value is an envelope but does not
    /// decrypt under this key.
    pub fn decrypt(&self, value: &str) -> Result<String, CipherError> {
        let Some((iv, ct_hex)) = split_envelope(value) else {
            return Ok(value.to_owned());
        };
        let ciphertext = hex::decode(ct_hex).map_err(|_| CipherError::InvalidHex)?;
        let plaintext = self.decrypt_with_iv(&ciphertext, &iv).inspect_err(|e| {
            warn!(error = %e, "field envelope failed to decrypt");
        })?;
        String::from_utf8(plaintext).map_err(|_| {
            warn!("field envelope decrypted to non-UTF-8 bytes");
            CipherError::InvalidUtf8
        })
    }

    /// Encrypt a byte buffer, returning the ciphertext and its hex IV separately.
    pub fn encrypt_buffer(&self, plaintext: &[u8]) -> SealedBuffer {
        let iv = random_iv();
        let ciphertext = Aes256CbcEnc::new(self.key_array(), GenericArray::from_slice(&iv))
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        SealedBuffer {
            ciphertext,
            iv_hex: hex::encode(iv),
        }
    }

    /// Decrypt a buffer produced by [`SymmetricCipher::encrypt_buffer`].
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidIv`] for a malformed IV, and
    /// [`CipherError::Truncated`] or [`CipherError::Padding`] if the
    /// ciphertext does not decrypt.
    pub fn decrypt_buffer(
        &self,
        ciphertext: &[u8],
        iv_hex: &str,
    ) -> Result<Vec<u8>, CipherError> {
        let iv = decode_iv(iv_hex)?;
        self.decrypt_with_iv(ciphertext, &iv)
    }

    fn key_array(&self) -> &GenericArray<u8, U32> {
        GenericArray::from_slice(self.key.as_bytes())
    }

    fn decrypt_with_iv(
        &self,
        ciphertext: &[u8],
        iv: &[u8; IV_LEN],
    ) -> Result<Vec<u8>, CipherError> {
        if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
            return Err(CipherError::Truncated(ciphertext.len()));
        }
        Aes256CbcDec::new(self.key_array(), GenericArray::from_slice(iv))
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::Padding)
    }
}
