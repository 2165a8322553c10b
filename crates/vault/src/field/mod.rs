//! Field-level protection of PII columns.
//!
//! # Responsibilities
//!
//! - Know which fields of each entity kind hold PII ([`policy`]).
//! - Encrypt, decrypt, and mask those fields inside JSON records ([`protector`]).
//!
//! Encrypted values replace the plaintext in the same text column; the
//! envelope format is self-describing, so no schema change is needed.

pub mod policy;
pub mod protector;

pub use policy::EntityKind;
pub use protector::{mask_value, FieldProtector, ProtectedField, Record, MASK_PLACEHOLDER};
