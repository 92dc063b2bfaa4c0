//! psique-billing
//!
//! Plans, entitlements and the Stripe subscription lifecycle.

pub mod error;
pub mod plans;
pub mod stripe;
pub mod webhook;
