//! psique-storage
//!
//! S3 persistence. Records are JSON objects; uploads go through presigned
//! URLs so file bytes never pass through the API.

pub mod bucket;
pub mod client;
pub mod error;
pub mod records;
