//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No PII or key material** may appear in any log field: no plaintext, no
//!   envelopes, no document bytes. Sizes, ids, and outcomes only.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

pub mod init;

pub use init::init;
