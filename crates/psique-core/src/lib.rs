//! psique-core
//!
//! Pure domain types and object key conventions.
//! No AWS SDK dependency; this is the shared vocabulary of the Psique system.

pub mod error;
pub mod keys;
pub mod models;
pub mod text;
