//! Financial summary over a date range.

use std::collections::BTreeMap;

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use psique_core::models::session::{PaymentStatus, Session, SessionStatus};

use crate::calendar::DateRange;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusCounts {
    pub scheduled: u32,
    pub confirmed: u32,
    pub completed: u32,
    pub cancelled: u32,
    pub no_show: u32,
}

impl StatusCounts {
    fn add(&mut self, status: SessionStatus) {
        let slot = match status {
            SessionStatus::Scheduled => &mut self.scheduled,
            SessionStatus::Confirmed => &mut self.confirmed,
            SessionStatus::Completed => &mut self.completed,
            SessionStatus::Cancelled => &mut self.cancelled,
            SessionStatus::NoShow => &mut self.no_show,
        };
        *slot += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientBalance {
    pub patient_id: Uuid,
    pub sessions: u32,
    pub received_cents: i64,
    pub pending_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    pub range: DateRange,
    pub received_cents: i64,
    pub pending_cents: i64,
    pub waived_cents: i64,
    pub refunded_cents: i64,
    /// What the period should bring in: received plus still pending.
    pub expected_cents: i64,
    pub sessions: StatusCounts,
    pub by_patient: Vec<PatientBalance>,
}

/// Summarise sessions whose local start date falls inside `range`.
///
/// Amounts are grouped by payment status. Cancelling waives a pending
/// charge, so cancelled sessions only contribute money that actually moved
/// (paid or refunded).
pub fn financial_summary(sessions: &[Session], range: DateRange, tz: &TimeZone) -> FinancialSummary {
    let mut summary = FinancialSummary {
        range,
        received_cents: 0,
        pending_cents: 0,
        waived_cents: 0,
        refunded_cents: 0,
        expected_cents: 0,
        sessions: StatusCounts::default(),
        by_patient: Vec::new(),
    };
    let mut patients: BTreeMap<Uuid, PatientBalance> = BTreeMap::new();

    for session in sessions {
        if !range.contains(session.starts_at.to_zoned(tz.clone()).date()) {
            continue;
        }
        summary.sessions.add(session.status);

        let balance = patients
            .entry(session.patient_id)
            .or_insert_with(|| PatientBalance {
                patient_id: session.patient_id,
                ..PatientBalance::default()
            });
        balance.sessions += 1;

        let amount = session.payment.price_cents;
        match session.payment.status {
            PaymentStatus::Paid => {
                add_cents(&mut summary.received_cents, amount);
                add_cents(&mut balance.received_cents, amount);
            }
            PaymentStatus::Pending => {
                add_cents(&mut summary.pending_cents, amount);
                add_cents(&mut balance.pending_cents, amount);
            }
            PaymentStatus::Waived => add_cents(&mut summary.waived_cents, amount),
            PaymentStatus::Refunded => add_cents(&mut summary.refunded_cents, amount),
        }
    }

    summary.expected_cents = summary.received_cents.saturating_add(summary.pending_cents);
    summary.by_patient = patients.into_values().collect();
    summary
}

/// Totals saturate instead of wrapping when stored prices are out of range.
fn add_cents(total: &mut i64, amount: i64) {
    *total = total.saturating_add(amount);
}
