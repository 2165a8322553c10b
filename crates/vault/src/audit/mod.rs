//! Append-only access audit for protected documents.
//!
//! # Module invariants
//!
//! - Entries are only ever appended; nothing here updates or deletes them.
//! - An unavailable sink must never block document access: the document layer
//!   catches every [`AuditError`] and reports it through `tracing`.

pub mod file;
pub mod memory;
pub mod sink;

pub use file::JsonlAuditSink;
pub use memory::MemoryAuditSink;
pub use sink::{AuditError, AuditSink};

#[cfg(test)]
pub use sink::MockAuditSink;
