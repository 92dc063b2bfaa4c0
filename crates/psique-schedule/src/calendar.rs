//! Month/week/day grid geometry.
//!
//! Every range here is half-open: `start` is the first visible date and
//! `end` is the day after the last one.

use jiff::ToSpan;
use jiff::civil::{Date, Weekday};
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ScheduleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CalendarView {
    Month,
    Week,
    Day,
}

/// First column of the week grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// Column index (0..7) of `weekday` in a grid starting on `self`.
    pub fn column(self, weekday: Weekday) -> i8 {
        match self {
            WeekStart::Sunday => weekday.to_sunday_zero_offset(),
            WeekStart::Monday => weekday.to_monday_zero_offset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn days(&self) -> impl Iterator<Item = Date> + '_ {
        self.start.series(1.day()).take_while(move |d| *d < self.end)
    }

    /// The instants bounding this range in `tz`: midnight of `start` up to
    /// (excluding) midnight of `end`.
    pub fn to_timestamps(
        &self,
        tz: &TimeZone,
    ) -> Result<(jiff::Timestamp, jiff::Timestamp), ScheduleError> {
        let start = self.start.to_zoned(tz.clone())?.timestamp();
        let end = self.end.to_zoned(tz.clone())?.timestamp();
        Ok((start, end))
    }
}

/// One cell of the month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GridCell {
    pub date: Date,
    /// False for the leading/trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub is_weekend: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthGrid {
    pub year: i16,
    pub month: i8,
    pub week_start: WeekStart,
    pub weeks: Vec<[GridCell; 7]>,
}

impl MonthGrid {
    pub fn range(&self) -> DateRange {
        let start = self.weeks[0][0].date;
        let last = self.weeks[self.weeks.len() - 1][6].date;
        // `last` is never the maximum civil date for any supported year.
        DateRange::new(start, last.tomorrow().unwrap_or(last))
    }
}

/// Lay out a month as full weeks: the first row holds the 1st, the last
/// row holds the last day. Yields 4 to 6 rows.
pub fn month_grid(year: i16, month: i8, week_start: WeekStart) -> Result<MonthGrid, ScheduleError> {
    let first = Date::new(year, month, 1)?;
    let last = first.last_of_month();

    let lead = week_start.column(first.weekday());
    let trail = 6 - week_start.column(last.weekday());
    let start = first.checked_sub(i64::from(lead).days())?;
    let end = last.checked_add(i64::from(trail).days())?;

    let cells: Vec<GridCell> = start
        .series(1.day())
        .take_while(|d| *d <= end)
        .map(|date| GridCell {
            date,
            in_month: date.month() == month,
            is_weekend: matches!(date.weekday(), Weekday::Saturday | Weekday::Sunday),
        })
        .collect();
    let weeks = cells
        .chunks_exact(7)
        .map(|row| std::array::from_fn(|i| row[i]))
        .collect();

    Ok(MonthGrid {
        year,
        month,
        week_start,
        weeks,
    })
}

/// The seven dates of the week containing `anchor`.
pub fn week_days(anchor: Date, week_start: WeekStart) -> Result<[Date; 7], ScheduleError> {
    let start = start_of_week(anchor, week_start)?;
    let mut days = [start; 7];
    for (offset, slot) in days.iter_mut().enumerate().skip(1) {
        *slot = start.checked_add((offset as i64).days())?;
    }
    Ok(days)
}

pub fn start_of_week(anchor: Date, week_start: WeekStart) -> Result<Date, ScheduleError> {
    let back = week_start.column(anchor.weekday());
    Ok(anchor.checked_sub(i64::from(back).days())?)
}

/// The dates a view shows around `anchor`.
pub fn visible_range(
    view: CalendarView,
    anchor: Date,
    week_start: WeekStart,
) -> Result<DateRange, ScheduleError> {
    match view {
        CalendarView::Month => Ok(month_grid(anchor.year(), anchor.month(), week_start)?.range()),
        CalendarView::Week => {
            let start = start_of_week(anchor, week_start)?;
            Ok(DateRange::new(start, start.checked_add(7.days())?))
        }
        CalendarView::Day => Ok(DateRange::new(anchor, anchor.tomorrow()?)),
    }
}

/// Move the anchor `step` periods forward (negative = backward).
///
/// Month steps keep the day of month when possible and clamp otherwise,
/// so Jan 31 moves to the last day of February.
pub fn navigate(view: CalendarView, anchor: Date, step: i32) -> Result<Date, ScheduleError> {
    let step = i64::from(step);
    let next = match view {
        CalendarView::Month => anchor.checked_add(step.months())?,
        CalendarView::Week => anchor.checked_add((step * 7).days())?,
        CalendarView::Day => anchor.checked_add(step.days())?,
    };
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn february_2026_fits_in_four_sunday_rows() {
        // 2026-02-01 is a Sunday and the month has 28 days.
        let grid = month_grid(2026, 2, WeekStart::Sunday).unwrap();
        assert_eq!(grid.weeks.len(), 4);
        assert!(grid.weeks.iter().flatten().all(|c| c.in_month));
    }

    #[test]
    fn august_2026_needs_six_sunday_rows() {
        // Starts on Saturday, 31 days.
        let grid = month_grid(2026, 8, WeekStart::Sunday).unwrap();
        assert_eq!(grid.weeks.len(), 6);
        assert_eq!(grid.weeks[0][0].date, date(2026, 7, 26));
        assert!(!grid.weeks[0][0].in_month);
        assert_eq!(grid.weeks[0][6].date, date(2026, 8, 1));
        assert_eq!(grid.weeks[5][1].date, date(2026, 8, 31));
        assert_eq!(grid.weeks[5][6].date, date(2026, 9, 5));
    }

    #[test]
    fn monday_start_shifts_columns() {
        let grid = month_grid(2026, 2, WeekStart::Monday).unwrap();
        assert_eq!(grid.weeks[0][0].date, date(2026, 1, 26));
        assert_eq!(grid.weeks[0][6].date, date(2026, 2, 1));
        assert!(grid.weeks[0][6].is_weekend);
        assert_eq!(grid.weeks.len(), 5);
    }

    #[test]
    fn month_range_matches_grid() {
        let range = visible_range(CalendarView::Month, date(2026, 8, 17), WeekStart::Sunday).unwrap();
        assert_eq!(range.start, date(2026, 7, 26));
        assert_eq!(range.end, date(2026, 9, 6));
        assert_eq!(range.days().count(), 42);
    }

    #[test]
    fn week_range_is_seven_days() {
        // 2026-10-21 is a Wednesday.
        let range = visible_range(CalendarView::Week, date(2026, 10, 21), WeekStart::Sunday).unwrap();
        assert_eq!(range.start, date(2026, 10, 18));
        assert_eq!(range.end, date(2026, 10, 25));

        let days = week_days(date(2026, 10, 21), WeekStart::Monday).unwrap();
        assert_eq!(days[0], date(2026, 10, 19));
        assert_eq!(days[6], date(2026, 10, 25));
    }

    #[test]
    fn day_range_is_single_date() {
        let range = visible_range(CalendarView::Day, date(2026, 12, 31), WeekStart::Sunday).unwrap();
        assert!(range.contains(date(2026, 12, 31)));
        assert!(!range.contains(date(2027, 1, 1)));
    }

    #[test]
    fn month_navigation_clamps_day() {
        assert_eq!(
            navigate(CalendarView::Month, date(2026, 1, 31), 1).unwrap(),
            date(2026, 2, 28)
        );
        assert_eq!(
            navigate(CalendarView::Month, date(2026, 3, 15), -3).unwrap(),
            date(2025, 12, 15)
        );
        assert_eq!(
            navigate(CalendarView::Week, date(2026, 12, 28), 1).unwrap(),
            date(2027, 1, 4)
        );
        assert_eq!(
            navigate(CalendarView::Day, date(2026, 3, 1), -1).unwrap(),
            date(2026, 2, 28)
        );
    }

    #[test]
    fn range_timestamps_follow_time_zone() {
        let tz = TimeZone::get("America/Sao_Paulo").unwrap();
        let range = DateRange::new(date(2026, 10, 19), date(2026, 10, 20));
        let (start, end) = range.to_timestamps(&tz).unwrap();
        assert_eq!(start.to_string(), "2026-10-19T03:00:00Z");
        assert_eq!(end.to_string(), "2026-10-20T03:00:00Z");
    }
}
