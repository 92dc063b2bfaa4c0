use jiff::civil::{Date, date};
use jiff::tz::TimeZone;
use uuid::Uuid;

use psique_core::models::session::{Modality, Session, SessionPayment, SessionStatus};
use psique_schedule::bucket::{bucket_by_day, build_calendar};
use psique_schedule::calendar::{CalendarView, DateRange, WeekStart};
use psique_schedule::recurrence::{RecurrenceInterval, RecurrenceRule, generate_occurrences};

fn sao_paulo() -> TimeZone {
    TimeZone::get("America/Sao_Paulo").unwrap()
}

fn session_at(day: Date, hour: i8, minute: i8) -> Session {
    let starts_at = day
        .at(hour, minute, 0, 0)
        .to_zoned(sao_paulo())
        .unwrap()
        .timestamp();
    Session {
        id: Uuid::new_v4(),
        professional_id: "pro".into(),
        patient_id: Uuid::new_v4(),
        starts_at,
        duration_minutes: 50,
        modality: Modality::Online,
        status: SessionStatus::Scheduled,
        payment: SessionPayment::pending(18_000),
        recurrence_id: None,
        cancellation_reason: None,
        created_at: starts_at,
        updated_at: starts_at,
    }
}

#[test]
fn late_evening_sessions_stay_on_their_local_day() {
    // 23:30 in São Paulo is already the next day in UTC.
    let late = session_at(date(2026, 10, 19), 23, 30);
    let range = DateRange::new(date(2026, 10, 19), date(2026, 10, 21));
    let days = bucket_by_day(&[late.clone()], range, &sao_paulo());

    assert_eq!(days.len(), 2);
    assert_eq!(days[0].date, date(2026, 10, 19));
    assert_eq!(days[0].sessions[0].id, late.id);
    assert!(days[1].sessions.is_empty());
}

#[test]
fn buckets_are_sorted_by_start_time() {
    let day = date(2026, 10, 20);
    let afternoon = session_at(day, 15, 0);
    let morning = session_at(day, 8, 0);
    let range = DateRange::new(day, date(2026, 10, 21));
    let days = bucket_by_day(&[afternoon.clone(), morning.clone()], range, &sao_paulo());

    let ids: Vec<Uuid> = days[0].sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![morning.id, afternoon.id]);
}

#[test]
fn month_calendar_contains_recurring_series() {
    let rule = RecurrenceRule {
        interval: RecurrenceInterval::Weekly,
        starts_at: date(2026, 10, 6).at(19, 0, 0, 0),
        until: date(2026, 12, 31),
    };
    let series: Vec<Session> = generate_occurrences(&rule, &sao_paulo())
        .unwrap()
        .into_iter()
        .map(|z| session_at(z.date(), z.hour(), z.minute()))
        .collect();

    let calendar = build_calendar(
        CalendarView::Month,
        date(2026, 10, 19),
        WeekStart::Sunday,
        &series,
        &sao_paulo(),
    )
    .unwrap();

    let grid = calendar.grid.as_ref().unwrap();
    assert_eq!(grid.weeks.len(), 5);
    assert_eq!(calendar.days.len(), 35);

    // October 2026 ends on a Saturday, so November is not visible.
    let populated: Vec<Date> = calendar
        .days
        .iter()
        .filter(|d| !d.sessions.is_empty())
        .map(|d| d.date)
        .collect();
    assert_eq!(
        populated,
        vec![
            date(2026, 10, 6),
            date(2026, 10, 13),
            date(2026, 10, 20),
            date(2026, 10, 27)
        ]
    );
}

#[test]
fn week_calendar_has_no_grid() {
    let calendar = build_calendar(
        CalendarView::Week,
        date(2026, 10, 19),
        WeekStart::Monday,
        &[],
        &sao_paulo(),
    )
    .unwrap();
    assert!(calendar.grid.is_none());
    assert_eq!(calendar.days.len(), 7);
    assert_eq!(calendar.days[0].date, date(2026, 10, 19));
}
