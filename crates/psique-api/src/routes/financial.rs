use axum::extract::{Query, State};
use axum::{Extension, Json};
use jiff::ToSpan;
use jiff::civil::Date;
use serde::Deserialize;

use psique_schedule::calendar::DateRange;
use psique_schedule::finance::{FinancialSummary, financial_summary};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<Date>,
    /// Inclusive.
    pub to: Option<Date>,
}

/// Turn the inclusive `from..=to` of the query into a half-open range.
/// Missing bounds default to the month containing `today`.
pub fn summary_range(query: &SummaryQuery, today: Date) -> Result<DateRange, ApiError> {
    let month_start = today.first_of_month();
    let from = query.from.unwrap_or(month_start);
    let to = match query.to {
        Some(to) => to,
        None => from.last_of_month(),
    };
    if to < from {
        return Err(ApiError::BadRequest("`to` must not be before `from`".to_string()));
    }
    if from.checked_add(1.year())? < to {
        return Err(ApiError::BadRequest("range must not exceed one year".to_string()));
    }
    Ok(DateRange::new(from, to.tomorrow()?))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<FinancialSummary>, ApiError> {
    let tz = tenant::time_zone(&state, &user).await?;
    let range = summary_range(&query, tenant::today(&tz))?;
    let sessions = tenant::sessions(&state, &user).await?;
    Ok(Json(financial_summary(&sessions, range, &tz)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn defaults_to_the_current_month() {
        let query = SummaryQuery { from: None, to: None };
        let range = summary_range(&query, date(2026, 2, 14)).unwrap();
        assert_eq!(range, DateRange::new(date(2026, 2, 1), date(2026, 3, 1)));
    }

    #[test]
    fn inclusive_end_becomes_exclusive() {
        let query = SummaryQuery {
            from: Some(date(2026, 10, 1)),
            to: Some(date(2026, 10, 15)),
        };
        let range = summary_range(&query, date(2026, 10, 19)).unwrap();
        assert!(range.contains(date(2026, 10, 15)));
        assert!(!range.contains(date(2026, 10, 16)));
    }

    #[test]
    fn rejects_reversed_and_oversized_ranges() {
        let reversed = SummaryQuery {
            from: Some(date(2026, 10, 2)),
            to: Some(date(2026, 10, 1)),
        };
        assert!(summary_range(&reversed, date(2026, 10, 19)).is_err());

        let huge = SummaryQuery {
            from: Some(date(2020, 1, 1)),
            to: Some(date(2026, 1, 1)),
        };
        assert!(summary_range(&huge, date(2026, 10, 19)).is_err());
    }
}
