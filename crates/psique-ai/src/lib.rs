//! psique-ai
//!
//! Bedrock invocations behind SmartNotes, evolution drafts and the
//! per-patient assistant.

pub mod chat;
pub mod client;
pub mod context;
pub mod converse;
pub mod error;
pub mod notes;
pub mod prompts;
pub mod tokens;

pub use converse::AiResult;
