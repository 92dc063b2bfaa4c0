//! Recurring session generation.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{ToSpan, Zoned};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ScheduleError;

/// Upper bound on sessions created from one rule: two years of weekly
/// sessions.
pub const MAX_OCCURRENCES: usize = 104;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RecurrenceInterval {
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecurrenceRule {
    pub interval: RecurrenceInterval,
    /// Wall-clock date and time of the first session.
    pub starts_at: DateTime,
    /// Last date on which a session may fall (inclusive).
    pub until: Date,
}

/// Expand `rule` into concrete instants in `tz`.
///
/// The wall-clock time of the first session is kept for every occurrence,
/// even across DST changes. Monthly occurrences are computed from the first
/// date each time (not chained) so a rule starting on the 31st lands on the
/// last day of short months and returns to the 31st afterwards.
pub fn generate_occurrences(rule: &RecurrenceRule, tz: &TimeZone) -> Result<Vec<Zoned>, ScheduleError> {
    let first = rule.starts_at.date();
    if rule.until < first {
        return Err(ScheduleError::UntilBeforeStart {
            first,
            until: rule.until,
        });
    }

    let mut occurrences = Vec::new();
    for n in 0_i64.. {
        let date = nth_date(first, rule.interval, n)?;
        if date > rule.until {
            break;
        }
        if occurrences.len() == MAX_OCCURRENCES {
            return Err(ScheduleError::TooManyOccurrences {
                max: MAX_OCCURRENCES,
            });
        }
        let local = date.to_datetime(rule.starts_at.time());
        occurrences.push(local.to_zoned(tz.clone())?);
    }

    Ok(occurrences)
}

fn nth_date(first: Date, interval: RecurrenceInterval, n: i64) -> Result<Date, ScheduleError> {
    let date = match interval {
        RecurrenceInterval::Weekly => first.checked_add((7 * n).days())?,
        RecurrenceInterval::Biweekly => first.checked_add((14 * n).days())?,
        RecurrenceInterval::Monthly => first.checked_add(n.months())?,
    };
    Ok(date)
}
