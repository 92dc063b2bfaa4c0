use axum::extract::{Query, State};
use axum::{Extension, Json};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use psique_core::models::session::Session;
use psique_schedule::bucket::{Calendar, bucket_by_day, build_calendar};
use psique_schedule::calendar::{CalendarView, DateRange, WeekStart};
use psique_schedule::layout::{DayLayout, VisibleHours, layout_day};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default = "default_view")]
    pub view: CalendarView,
    /// Any date inside the period to show; defaults to today.
    pub date: Option<Date>,
    /// Overrides the professional's preference.
    pub week_start: Option<WeekStart>,
}

fn default_view() -> CalendarView {
    CalendarView::Month
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Calendar>, ApiError> {
    let profile = tenant::profile(&state, &user).await?;
    let tz = profile.time_zone()?;
    let anchor = query.date.unwrap_or_else(|| tenant::today(&tz));
    let week_start = query.week_start.unwrap_or(if profile.week_starts_monday {
        WeekStart::Monday
    } else {
        WeekStart::Sunday
    });

    let sessions = tenant::sessions(&state, &user).await?;
    Ok(Json(build_calendar(query.view, anchor, week_start, &sessions, &tz)?))
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<Date>,
    pub start_hour: Option<i8>,
    pub end_hour: Option<i8>,
}

/// Timeline blocks for the day view, with the sessions they refer to.
#[derive(Debug, Serialize)]
pub struct DayView {
    pub layout: DayLayout,
    pub sessions: Vec<Session>,
}

pub async fn get_day(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> Result<Json<DayView>, ApiError> {
    let tz = tenant::time_zone(&state, &user).await?;
    let date = query.date.unwrap_or_else(|| tenant::today(&tz));
    let defaults = VisibleHours::default();
    let hours = VisibleHours::new(
        query.start_hour.unwrap_or(defaults.start_hour),
        query.end_hour.unwrap_or(defaults.end_hour),
    )?;

    let all = tenant::sessions(&state, &user).await?;
    let layout = layout_day(&all, date, &tz, hours)?;
    let sessions = bucket_by_day(&all, DateRange::new(date, date.tomorrow()?), &tz)
        .into_iter()
        .flat_map(|day| day.sessions)
        .collect();

    Ok(Json(DayView { layout, sessions }))
}
