//! psique-export
//!
//! Clinical record export: a Tera template rendered to a Markdown subset,
//! then laid out as DOCX.

pub mod docx;
pub mod error;
pub mod record;
pub mod render;
pub mod styles;
