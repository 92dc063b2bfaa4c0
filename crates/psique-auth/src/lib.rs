//! psique-auth
//!
//! Cognito access/id token validation.

pub mod error;
pub mod jwks;
pub mod jwt;
