//! psique-schedule
//!
//! Calendar view state and appointment lifecycle rules. Pure logic, no AWS
//! dependency. Dates are civil dates in the professional's time zone;
//! instants are `jiff::Timestamp`s.

pub mod bucket;
pub mod calendar;
pub mod conflict;
pub mod error;
pub mod finance;
pub mod layout;
pub mod lifecycle;
pub mod recurrence;
