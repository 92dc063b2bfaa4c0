use psique_core::models::session::{PaymentStatus, SessionStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("date arithmetic failed: {0}")]
    Date(#[from] jiff::Error),

    #[error("recurrence ends ({until}) before its first session ({first})")]
    UntilBeforeStart {
        first: jiff::civil::Date,
        until: jiff::civil::Date,
    },

    #[error("recurrence would create more than {max} sessions")]
    TooManyOccurrences { max: usize },

    #[error("cannot change session status from {from:?} to {to:?}")]
    InvalidTransition { from: SessionStatus, to: SessionStatus },

    #[error("cannot change payment status from {from:?} to {to:?}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("a cancelled session cannot be marked as paid")]
    PaymentOnCancelledSession,

    #[error("a {0:?} session can no longer be rescheduled")]
    NotReschedulable(SessionStatus),

    #[error("duration must be between 1 and {max} minutes")]
    InvalidDuration { max: u32 },

    #[error("price must be between 0 and {max} cents")]
    InvalidPrice { max: i64 },

    #[error("invalid visible hours {start}..{end}")]
    InvalidHours { start: i8, end: i8 },
}
