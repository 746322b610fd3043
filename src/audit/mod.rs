//! Append-only audit trail of harvest activity.

pub mod logger;

pub use logger::{AuditLogger, AuditRecord};
