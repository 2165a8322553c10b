//! [`FieldProtector`]: encrypt, decrypt, and mask named text fields of a record.

use common::VaultError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::policy::EntityKind;
use crate::crypto::{is_encrypted, SymmetricCipher};

/// A JSON object as read from or written to the caller's store.
pub type Record = serde_json::Map<String, Value>;

/// Shown in place of values too short to mask partially.
pub const MASK_PLACEHOLDER: &str = "****";

/// Mask all but the last `visible` characters of `value` with `*`.
///
/// Values of `visible` characters or fewer are replaced by
/// [`MASK_PLACEHOLDER`] so short values never leak in full. Length is counted
/// in Unicode scalar values, not bytes.
pub fn mask_value(value: &str, visible: usize) -> String {
    let len = value.chars().count();
    if len <= visible {
        return MASK_PLACEHOLDER.to_owned();
    }
    let tail: String = value.chars().skip(len - visible).collect();
    format!("{}{tail}", "*".repeat(len - visible))
}

/// One encrypted scalar, addressed by entity and field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectedField {
    pub entity_type: String,
    pub entity_id: String,
    pub field_name: String,
    /// The envelope (or legacy plaintext) as stored.
    pub value: String,
}

/// Applies the cipher to individual fields of JSON records.
///
/// Only string values are touched; numbers, booleans, nulls, arrays and
/// objects under a protected name are left as they are.
#[derive(Clone, Debug)]
pub struct FieldProtector {
    cipher: SymmetricCipher,
    visible_chars: usize,
}

impl FieldProtector {
    /// `visible_chars` is the suffix length [`FieldProtector::reveal_full`]
    /// leaves readable for callers without full access.
    pub fn new(cipher: SymmetricCipher, visible_chars: usize) -> Self {
        Self {
            cipher,
            visible_chars,
        }
    }

    /// Encrypt every named, non-empty string field that is not already an envelope.
    ///
    /// Idempotent: protecting a protected record changes nothing.
    pub fn protect(&self, record: &Record, fields: &[&str]) -> Record {
        let mut out = record.clone();
        for name in fields {
            if let Some(Value::String(s)) = out.get_mut(*name) {
                if !s.is_empty() && !is_encrypted(s) {
                    *s = self.cipher.encrypt(s);
                }
            }
        }
        out
    }

    /// Decrypt every named field that holds an envelope; plaintext stays as is.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decryption`] naming the first field whose
    /// envelope does not decrypt. The record is never partially returned.
    pub fn reveal(&self, record: &Record, fields: &[&str]) -> Result<Record, VaultError> {
        let mut out = record.clone();
        for name in fields {
            if let Some(Value::String(s)) = out.get_mut(*name) {
                *s = self.decrypt_named(name, s)?;
            }
        }
        Ok(out)
    }

    /// Decrypt where needed, then mask every named non-empty string field.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decryption`] if a named envelope does not decrypt.
    pub fn mask(
        &self,
        record: &Record,
        fields: &[&str],
        visible_chars: usize,
    ) -> Result<Record, VaultError> {
        let mut out = record.clone();
        for name in fields {
            if let Some(Value::String(s)) = out.get_mut(*name) {
                if s.is_empty() {
                    continue;
                }
                let plain = self.decrypt_named(name, s)?;
                *s = mask_value(&plain, visible_chars);
            }
        }
        Ok(out)
    }

    /// Reveal for callers with full access, mask for everyone else.
    ///
    /// Deciding who gets `full_access` is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decryption`] if a named envelope does not decrypt.
    pub fn reveal_full(
        &self,
        record: &Record,
        fields: &[&str],
        full_access: bool,
    ) -> Result<Record, VaultError> {
        if full_access {
            self.reveal(record, fields)
        } else {
            self.mask(record, fields, self.visible_chars)
        }
    }

    /// [`FieldProtector::protect`] with the allow-list of `kind`.
    pub fn protect_entity(&self, record: &Record, kind: EntityKind) -> Record {
        self.protect(record, kind.protected_fields())
    }

    /// [`FieldProtector::reveal_full`] with the allow-list of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decryption`] if a protected envelope does not decrypt.
    pub fn reveal_full_entity(
        &self,
        record: &Record,
        kind: EntityKind,
        full_access: bool,
    ) -> Result<Record, VaultError> {
        self.reveal_full(record, kind.protected_fields(), full_access)
    }

    /// Encrypt one value into its addressed form.
    pub fn seal_field(
        &self,
        kind: EntityKind,
        entity_id: impl Into<String>,
        field_name: impl Into<String>,
        value: &str,
    ) -> ProtectedField {
        let value = if is_encrypted(value) {
            value.to_owned()
        } else {
            self.cipher.encrypt(value)
        };
        ProtectedField {
            entity_type: kind.as_str().to_owned(),
            entity_id: entity_id.into(),
            field_name: field_name.into(),
            value,
        }
    }

    /// Decrypt an addressed value.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Decryption`] if the stored envelope does not decrypt.
    pub fn open_field(&self, field: &ProtectedField) -> Result<String, VaultError> {
        self.decrypt_named(&field.field_name, &field.value)
    }

    fn decrypt_named(&self, name: &str, value: &str) -> Result<String, VaultError> {
        self.cipher
            .decrypt(value)
            .map_err(|e| VaultError::Decryption(format!("field {name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{SymmetricKey, KEY_LEN};
    use serde_json::json;

    fn protector() -> FieldProtector {
        let cipher = SymmetricCipher::new(SymmetricKey::from_bytes([0x42; KEY_LEN]));
        FieldProtector::new(cipher, 4)
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn mask_examples() {
        assert_eq!(mask_value("12345678A", 4), "*****678A");
        assert_eq!(mask_value("AB", 4), "****");
        assert_eq!(mask_value("ABCD", 4), "****");
        assert_eq!(mask_value("ABCDE", 4), "*BCDE");
        assert_eq!(mask_value("+34 600 123 456", 3), "************456");
        assert_eq!(mask_value("ñandúes", 2), "*****es");
    }

    #[test]
    fn protect_encrypts_only_named_strings() {
        let p = protector();
        let rec = record(json!({
            "idNumber": "12345678A",
            "name": "Ana",
            "phone": "",
            "dateOfBirth": null,
            "address": 42
        }));
        let out = p.protect(&rec, &["idNumber", "phone", "dateOfBirth", "address", "missing"]);
        assert!(is_encrypted(out["idNumber"].as_str().unwrap()));
        assert_eq!(out["name"], "Ana");
        assert_eq!(out["phone"], "");
        assert_eq!(out["dateOfBirth"], Value::Null);
        assert_eq!(out["address"], 42);
        assert!(!out.contains_key("missing"));
    }

    #[test]
    fn protect_is_idempotent() {
        let p = protector();
        let rec = record(json!({"idNumber": "12345678A", "phone": "600123456"}));
        let once = p.protect(&rec, &["idNumber", "phone"]);
        let twice = p.protect(&once, &["idNumber", "phone"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn reveal_inverts_protect_and_keeps_plaintext() {
        let p = protector();
        let rec = record(json!({"idNumber": "12345678A", "phone": "600123456"}));
        let protected = p.protect(&rec, &["idNumber"]);
        let revealed = p.reveal(&protected, &["idNumber", "phone"]).unwrap();
        assert_eq!(revealed, rec);
    }

    #[test]
    fn reveal_reports_undecryptable_field() {
        let p = protector();
        let other = SymmetricCipher::new(SymmetricKey::from_bytes([0x07; KEY_LEN]));
        // Two full blocks so a foreign key cannot plausibly yield valid padding and UTF-8.
        let foreign = other.encrypt("a value encrypted under another key");
        let rec = record(json!({ "idNumber": foreign }));
        let err = p.reveal(&rec, &["idNumber"]).unwrap_err();
        assert_eq!(err.code(), "decryption_failed");
        assert!(err.to_string().contains("idNumber"));
    }

    #[test]
    fn mask_decrypts_first() {
        let p = protector();
        let rec = record(json!({"idNumber": "12345678A", "phone": "600", "address": ""}));
        let protected = p.protect(&rec, &["idNumber", "phone"]);
        let masked = p.mask(&protected, &["idNumber", "phone", "address"], 4).unwrap();
        assert_eq!(masked["idNumber"], "*****678A");
        assert_eq!(masked["phone"], "****");
        assert_eq!(masked["address"], "");
    }

    #[test]
    fn reveal_full_depends_on_access() {
        let p = protector();
        let rec = record(json!({"ownerIdNumber": "X1234567Z", "companyName": "Acme LLC"}));
        let stored = p.protect_entity(&rec, EntityKind::LlcApplication);

        let full = p
            .reveal_full_entity(&stored, EntityKind::LlcApplication, true)
            .unwrap();
        assert_eq!(full["ownerIdNumber"], "X1234567Z");

        let limited = p
            .reveal_full_entity(&stored, EntityKind::LlcApplication, false)
            .unwrap();
        assert_eq!(limited["ownerIdNumber"], "*****567Z");
        assert_eq!(limited["companyName"], "Acme LLC");
    }

    #[test]
    fn sealed_field_round_trip() {
        let p = protector();
        let field = p.seal_field(EntityKind::UserProfile, "user-1", "passportNumber", "PAB123456");
        assert_eq!(field.entity_type, "user_profile");
        assert!(is_encrypted(&field.value));
        assert_eq!(p.open_field(&field).unwrap(), "PAB123456");

        let resealed = p.seal_field(EntityKind::UserProfile, "user-1", "passportNumber", &field.value);
        assert_eq!(resealed.value, field.value);
    }
}
