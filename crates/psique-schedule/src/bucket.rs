//! Grouping sessions into calendar days.

use std::collections::BTreeMap;

use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use psique_core::models::session::Session;

use crate::calendar::{CalendarView, DateRange, MonthGrid, WeekStart, month_grid, visible_range};
use crate::error::ScheduleError;

/// The sessions starting on one local date.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DaySessions {
    pub date: Date,
    pub sessions: Vec<Session>,
}

/// Everything the calendar screen needs for one view.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Calendar {
    pub view: CalendarView,
    pub anchor: Date,
    pub range: DateRange,
    /// Present for the month view only.
    pub grid: Option<MonthGrid>,
    pub days: Vec<DaySessions>,
}

/// Group `sessions` by their local start date in `tz`.
///
/// Every date of `range` gets an entry, empty or not, in date order.
/// Sessions starting outside the range are dropped. Within a day sessions
/// are ordered by start time, then id, so the output is deterministic.
pub fn bucket_by_day(sessions: &[Session], range: DateRange, tz: &TimeZone) -> Vec<DaySessions> {
    let mut buckets: BTreeMap<Date, Vec<Session>> =
        range.days().map(|date| (date, Vec::new())).collect();

    for session in sessions {
        let local = session.starts_at.to_zoned(tz.clone()).date();
        if let Some(bucket) = buckets.get_mut(&local) {
            bucket.push(session.clone());
        }
    }

    buckets
        .into_iter()
        .map(|(date, mut sessions)| {
            sessions.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then(a.id.cmp(&b.id)));
            DaySessions { date, sessions }
        })
        .collect()
}

/// Build the calendar for `view` around `anchor`.
pub fn build_calendar(
    view: CalendarView,
    anchor: Date,
    week_start: WeekStart,
    sessions: &[Session],
    tz: &TimeZone,
) -> Result<Calendar, ScheduleError> {
    let range = visible_range(view, anchor, week_start)?;
    let grid = match view {
        CalendarView::Month => Some(month_grid(anchor.year(), anchor.month(), week_start)?),
        CalendarView::Week | CalendarView::Day => None,
    };
    let days = bucket_by_day(sessions, range, tz);
    Ok(Calendar {
        view,
        anchor,
        range,
        grid,
        days,
    })
}
