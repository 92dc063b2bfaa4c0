//! psique-audit
//!
//! Structured audit events for access to clinical data.

pub mod events;

pub use events::{AuditAction, AuditEvent, ResourceType};
