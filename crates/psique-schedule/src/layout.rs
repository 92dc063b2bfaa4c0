//! Timeline layout for the day and week views.
//!
//! Sessions are positioned in minutes relative to the first visible hour.
//! Overlapping sessions are split into side-by-side lanes; all sessions in
//! one overlap cluster report the same lane count so they share the column
//! width evenly.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use psique_core::models::session::Session;

use crate::error::ScheduleError;

/// Smallest block height so very short sessions remain clickable.
pub const MIN_BLOCK_MINUTES: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VisibleHours {
    pub start_hour: i8,
    /// Exclusive; 24 means midnight of the next day.
    pub end_hour: i8,
}

impl Default for VisibleHours {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 23,
        }
    }
}

impl VisibleHours {
    pub fn new(start_hour: i8, end_hour: i8) -> Result<Self, ScheduleError> {
        if !(0..24).contains(&start_hour) || end_hour <= start_hour || end_hour > 24 {
            return Err(ScheduleError::InvalidHours {
                start: start_hour,
                end: end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn span_minutes(&self) -> i32 {
        (i32::from(self.end_hour) - i32::from(self.start_hour)) * 60
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PositionedSession {
    pub session_id: Uuid,
    pub top_minutes: i32,
    pub height_minutes: i32,
    pub lane: usize,
    pub lanes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DayLayout {
    pub date: Date,
    pub hours: VisibleHours,
    pub blocks: Vec<PositionedSession>,
    /// Sessions on this date that fall entirely outside the visible hours.
    pub outside_hours: Vec<Uuid>,
}

/// Position the sessions that start on `date` (local to `tz`).
pub fn layout_day(
    sessions: &[Session],
    date: Date,
    tz: &TimeZone,
    hours: VisibleHours,
) -> Result<DayLayout, ScheduleError> {
    let origin = date
        .at(hours.start_hour, 0, 0, 0)
        .to_zoned(tz.clone())?
        .timestamp();
    let span = hours.span_minutes();

    let mut placed: Vec<(Uuid, i32, i32)> = Vec::new();
    let mut outside_hours = Vec::new();

    for session in sessions {
        if session.starts_at.to_zoned(tz.clone()).date() != date {
            continue;
        }
        let start = minutes_between(origin, session.starts_at);
        let end = minutes_between(origin, session.ends_at());
        if end <= 0 || start >= span {
            outside_hours.push(session.id);
            continue;
        }
        let top = start.max(0);
        let bottom = end.min(span).max(top + MIN_BLOCK_MINUTES);
        placed.push((session.id, top, bottom));
    }

    placed.sort_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)).then(a.0.cmp(&b.0)));

    let mut blocks = Vec::with_capacity(placed.len());
    let mut cluster_start = 0;
    let mut cluster_end = i32::MIN;
    let mut lane_ends: Vec<i32> = Vec::new();

    for (id, top, bottom) in placed {
        if !blocks.is_empty() && top >= cluster_end {
            close_cluster(&mut blocks[cluster_start..], lane_ends.len());
            cluster_start = blocks.len();
            lane_ends.clear();
        }

        let lane = match lane_ends.iter().position(|end| *end <= top) {
            Some(free) => {
                lane_ends[free] = bottom;
                free
            }
            None => {
                lane_ends.push(bottom);
                lane_ends.len() - 1
            }
        };
        cluster_end = if cluster_start == blocks.len() {
            bottom
        } else {
            cluster_end.max(bottom)
        };

        blocks.push(PositionedSession {
            session_id: id,
            top_minutes: top,
            height_minutes: bottom - top,
            lane,
            lanes: 0,
        });
    }
    close_cluster(&mut blocks[cluster_start..], lane_ends.len());

    Ok(DayLayout {
        date,
        hours,
        blocks,
        outside_hours,
    })
}

fn close_cluster(cluster: &mut [PositionedSession], lanes: usize) {
    for block in cluster {
        block.lanes = lanes;
    }
}

fn minutes_between(from: jiff::Timestamp, to: jiff::Timestamp) -> i32 {
    let minutes = to.duration_since(from).as_secs().div_euclid(60);
    minutes.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
