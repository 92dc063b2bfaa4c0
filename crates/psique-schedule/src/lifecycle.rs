//! Session status and payment status transitions.
//!
//! ```text
//! scheduled -> confirmed | completed | cancelled | no_show
//! confirmed -> scheduled | completed | cancelled | no_show
//! cancelled -> scheduled
//! no_show   -> completed
//! completed -> (none)
//!
//! pending  -> paid | waived
//! waived   -> pending
//! paid     -> refunded | pending
//! refunded -> (none)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use psique_core::models::session::{
    MAX_PRICE_CENTS, PaymentMethod, PaymentStatus, Session, SessionStatus,
};

use crate::error::ScheduleError;

/// Longest bookable session.
pub const MAX_DURATION_MINUTES: u32 = 8 * 60;

pub fn can_transition(from: SessionStatus, to: SessionStatus) -> bool {
    use SessionStatus::*;
    matches!(
        (from, to),
        (Scheduled, Confirmed | Completed | Cancelled | NoShow)
            | (Confirmed, Scheduled | Completed | Cancelled | NoShow)
            | (Cancelled, Scheduled)
            | (NoShow, Completed)
    )
}

pub fn can_transition_payment(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (from, to),
        (Pending, Paid | Waived) | (Waived, Pending) | (Paid, Refunded | Pending)
    )
}

/// A status change requested by the professional.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusChange {
    pub status: SessionStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Apply a status change, keeping the payment consistent with it.
///
/// Cancelling waives a pending charge; reopening a cancelled session
/// restores a waived charge to pending.
pub fn change_status(
    session: &mut Session,
    change: StatusChange,
    now: jiff::Timestamp,
) -> Result<(), ScheduleError> {
    let from = session.status;
    let to = change.status;
    if !can_transition(from, to) {
        return Err(ScheduleError::InvalidTransition { from, to });
    }

    match to {
        SessionStatus::Cancelled => {
            session.cancellation_reason = change.reason;
            if session.payment.status == PaymentStatus::Pending {
                session.payment.status = PaymentStatus::Waived;
            }
        }
        SessionStatus::Scheduled if from == SessionStatus::Cancelled => {
            session.cancellation_reason = None;
            if session.payment.status == PaymentStatus::Waived {
                session.payment.status = PaymentStatus::Pending;
            }
        }
        _ => {}
    }

    session.status = to;
    session.updated_at = now;
    Ok(())
}

/// A payment change requested by the professional.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentAction {
    MarkPaid {
        method: PaymentMethod,
        #[serde(default)]
        paid_at: Option<jiff::Timestamp>,
    },
    MarkPending,
    Waive,
    Refund,
    /// Change the amount while the charge is still open.
    SetPrice { price_cents: i64 },
}

pub fn apply_payment(
    session: &mut Session,
    action: PaymentAction,
    now: jiff::Timestamp,
) -> Result<(), ScheduleError> {
    let from = session.payment.status;
    let to = match &action {
        PaymentAction::MarkPaid { .. } => PaymentStatus::Paid,
        PaymentAction::MarkPending => PaymentStatus::Pending,
        PaymentAction::Waive => PaymentStatus::Waived,
        PaymentAction::Refund => PaymentStatus::Refunded,
        PaymentAction::SetPrice { .. } => from,
    };

    if let PaymentAction::SetPrice { price_cents } = action {
        if from != PaymentStatus::Pending && from != PaymentStatus::Waived {
            return Err(ScheduleError::InvalidPaymentTransition { from, to });
        }
        if !(0..=MAX_PRICE_CENTS).contains(&price_cents) {
            return Err(ScheduleError::InvalidPrice {
                max: MAX_PRICE_CENTS,
            });
        }
        session.payment.price_cents = price_cents;
        session.updated_at = now;
        return Ok(());
    }

    if !can_transition_payment(from, to) {
        return Err(ScheduleError::InvalidPaymentTransition { from, to });
    }
    if to == PaymentStatus::Paid && session.status == SessionStatus::Cancelled {
        return Err(ScheduleError::PaymentOnCancelledSession);
    }

    match action {
        PaymentAction::MarkPaid { method, paid_at } => {
            session.payment.method = Some(method);
            session.payment.paid_at = Some(paid_at.unwrap_or(now));
        }
        PaymentAction::MarkPending => {
            session.payment.method = None;
            session.payment.paid_at = None;
        }
        PaymentAction::Waive | PaymentAction::Refund | PaymentAction::SetPrice { .. } => {}
    }

    session.payment.status = to;
    session.updated_at = now;
    Ok(())
}

/// Move a session to a new slot. Only open sessions can move; a confirmed
/// session goes back to scheduled because the patient confirmed the old time.
pub fn reschedule(
    session: &mut Session,
    starts_at: jiff::Timestamp,
    duration_minutes: u32,
    now: jiff::Timestamp,
) -> Result<(), ScheduleError> {
    validate_duration(duration_minutes)?;
    match session.status {
        SessionStatus::Scheduled | SessionStatus::Confirmed => {}
        other => return Err(ScheduleError::NotReschedulable(other)),
    }
    if session.starts_at != starts_at {
        session.status = SessionStatus::Scheduled;
    }
    session.starts_at = starts_at;
    session.duration_minutes = duration_minutes;
    session.updated_at = now;
    Ok(())
}

pub fn validate_duration(duration_minutes: u32) -> Result<(), ScheduleError> {
    if duration_minutes == 0 || duration_minutes > MAX_DURATION_MINUTES {
        return Err(ScheduleError::InvalidDuration {
            max: MAX_DURATION_MINUTES,
        });
    }
    Ok(())
}
