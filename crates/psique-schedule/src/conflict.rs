//! Overlap detection for bookings.
//!
//! Conflicts are advisory: the booking goes through and the caller shows
//! the overlapping sessions as warnings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use psique_core::models::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Conflict {
    /// Start of the slot being booked.
    pub requested_start: jiff::Timestamp,
    pub session_id: Uuid,
    pub patient_id: Uuid,
    pub starts_at: jiff::Timestamp,
    pub ends_at: jiff::Timestamp,
}

/// Sessions in `existing` that overlap `[start, end)`.
///
/// Cancelled and no-show sessions free their slot and are ignored, as is
/// `ignore` (the session being rescheduled).
pub fn find_conflicts(
    start: jiff::Timestamp,
    end: jiff::Timestamp,
    existing: &[Session],
    ignore: Option<Uuid>,
) -> Vec<Conflict> {
    let mut conflicts: Vec<Conflict> = existing
        .iter()
        .filter(|s| Some(s.id) != ignore && s.occupies_slot())
        .filter(|s| s.starts_at < end && start < s.ends_at())
        .map(|s| Conflict {
            requested_start: start,
            session_id: s.id,
            patient_id: s.patient_id,
            starts_at: s.starts_at,
            ends_at: s.ends_at(),
        })
        .collect();
    conflicts.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.session_id.cmp(&b.session_id)));
    conflicts
}

/// Conflicts for every slot of a batch against `existing`.
pub fn find_batch_conflicts(
    slots: &[(jiff::Timestamp, jiff::Timestamp)],
    existing: &[Session],
) -> Vec<Conflict> {
    slots
        .iter()
        .flat_map(|(start, end)| find_conflicts(*start, *end, existing, None))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use psique_core::models::session::{Modality, SessionPayment, SessionStatus};

    fn at(minutes: i64) -> jiff::Timestamp {
        jiff::Timestamp::UNIX_EPOCH
            .checked_add(SignedDuration::from_mins(minutes))
            .unwrap()
    }

    fn session(start_minute: i64, duration: u32, status: SessionStatus) -> Session {
        Session {
            id: Uuid::new_v4(),
            professional_id: "p".into(),
            patient_id: Uuid::new_v4(),
            starts_at: at(start_minute),
            duration_minutes: duration,
            modality: Modality::Online,
            status,
            payment: SessionPayment::pending(0),
            recurrence_id: None,
            cancellation_reason: None,
            created_at: at(0),
            updated_at: at(0),
        }
    }

    #[test]
    fn touching_sessions_do_not_conflict() {
        let existing = vec![session(60, 60, SessionStatus::Scheduled)];
        assert!(find_conflicts(at(120), at(170), &existing, None).is_empty());
        assert!(find_conflicts(at(10), at(60), &existing, None).is_empty());
    }

    #[test]
    fn partial_overlap_conflicts() {
        let existing = vec![session(60, 60, SessionStatus::Confirmed)];
        let conflicts = find_conflicts(at(100), at(150), &existing, None);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].session_id, existing[0].id);
    }

    #[test]
    fn cancelled_and_ignored_sessions_are_skipped() {
        let cancelled = session(60, 60, SessionStatus::Cancelled);
        let moving = session(60, 60, SessionStatus::Scheduled);
        let existing = vec![cancelled, moving.clone()];
        assert!(find_conflicts(at(60), at(120), &existing, Some(moving.id)).is_empty());
    }

    #[test]
    fn batch_reports_each_slot() {
        let existing = vec![
            session(0, 50, SessionStatus::Scheduled),
            session(1000, 50, SessionStatus::Scheduled),
        ];
        let slots = vec![(at(10), at(60)), (at(500), at(550)), (at(1020), at(1070))];
        let conflicts = find_batch_conflicts(&slots, &existing);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].requested_start, at(10));
        assert_eq!(conflicts[1].requested_start, at(1020));
    }
}
