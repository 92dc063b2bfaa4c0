use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::patient::Patient;
use psique_core::models::professional::Professional;
use psique_core::models::session::{
    Modality, Session, SessionInput, SessionPayment, SessionStatus, validate_price,
};
use psique_schedule::conflict::{Conflict, find_batch_conflicts, find_conflicts};
use psique_schedule::lifecycle::{
    PaymentAction, StatusChange, apply_payment, change_status, reschedule, validate_duration,
};
use psique_schedule::recurrence::{RecurrenceRule, generate_occurrences};
use psique_storage::error::StorageError;
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

/// A booked session with any sessions it overlaps. Overlaps are warnings;
/// the booking is saved either way.
#[derive(Debug, Serialize)]
pub struct BookedSession {
    pub session: Session,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Serialize)]
pub struct BookedSeries {
    pub recurrence_id: Uuid,
    pub sessions: Vec<Session>,
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Deserialize)]
pub struct RecurringInput {
    pub patient_id: Uuid,
    pub rule: RecurrenceRule,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleInput {
    pub starts_at: Timestamp,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub modality: Option<Modality>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    #[default]
    Single,
    /// This session and the later open sessions of its recurrence.
    Series,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub scope: DeleteScope,
}

#[derive(Debug, Serialize)]
pub struct DeletedSessions {
    pub deleted: Vec<Uuid>,
}

/// Booking values not given explicitly come from the patient, then the
/// professional's defaults.
struct Defaults {
    duration_minutes: u32,
    modality: Modality,
    price_cents: i64,
}

fn defaults(
    profile: &Professional,
    patient: &Patient,
    duration_minutes: Option<u32>,
    modality: Option<Modality>,
    price_cents: Option<i64>,
) -> Result<Defaults, ApiError> {
    let duration_minutes = duration_minutes.unwrap_or(profile.default_session_minutes);
    validate_duration(duration_minutes)?;
    let price_cents = price_cents
        .or(patient.session_price_cents)
        .unwrap_or(profile.default_price_cents);
    validate_price("price_cents", price_cents)?;
    Ok(Defaults {
        duration_minutes,
        modality: modality.unwrap_or(Modality::InPerson),
        price_cents,
    })
}

fn new_session(
    professional_id: &str,
    patient_id: Uuid,
    starts_at: Timestamp,
    defaults: &Defaults,
    recurrence_id: Option<Uuid>,
    now: Timestamp,
) -> Session {
    Session {
        id: Uuid::new_v4(),
        professional_id: professional_id.to_string(),
        patient_id,
        starts_at,
        duration_minutes: defaults.duration_minutes,
        modality: defaults.modality,
        status: SessionStatus::Scheduled,
        payment: SessionPayment::pending(defaults.price_cents),
        recurrence_id,
        cancellation_reason: None,
        created_at: now,
        updated_at: now,
    }
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<SessionInput>,
) -> Result<Json<BookedSession>, ApiError> {
    let profile = tenant::profile(&state, &user).await?;
    let patient = tenant::patient(&state, &user, input.patient_id).await?;
    let defaults = defaults(
        &profile,
        &patient,
        input.duration_minutes,
        input.modality,
        input.price_cents,
    )?;

    let session = new_session(
        &user.sub,
        patient.id,
        input.starts_at,
        &defaults,
        None,
        Timestamp::now(),
    );
    let existing = tenant::sessions(&state, &user).await?;
    let conflicts = find_conflicts(session.starts_at, session.ends_at(), &existing, None);

    records::save(&state.bucket, &keys::session(&user.sub, session.id), &session).await?;

    AuditEvent::new(AuditAction::Create, ResourceType::Session, session.id, &user.sub)
        .with_details(serde_json::json!({ "patient_id": patient.id, "conflicts": conflicts.len() }))
        .emit();
    Ok(Json(BookedSession { session, conflicts }))
}

/// Book every occurrence of a recurrence rule, expanded in the
/// professional's time zone.
pub async fn create_recurring(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<RecurringInput>,
) -> Result<Json<BookedSeries>, ApiError> {
    let profile = tenant::profile(&state, &user).await?;
    let tz = profile.time_zone()?;
    let patient = tenant::patient(&state, &user, input.patient_id).await?;
    let defaults = defaults(
        &profile,
        &patient,
        input.duration_minutes,
        input.modality,
        input.price_cents,
    )?;

    let occurrences = generate_occurrences(&input.rule, &tz)?;
    let recurrence_id = Uuid::new_v4();
    let now = Timestamp::now();
    let sessions: Vec<Session> = occurrences
        .iter()
        .map(|z| new_session(&user.sub, patient.id, z.timestamp(), &defaults, Some(recurrence_id), now))
        .collect();

    let existing = tenant::sessions(&state, &user).await?;
    let slots: Vec<(Timestamp, Timestamp)> =
        sessions.iter().map(|s| (s.starts_at, s.ends_at())).collect();
    let conflicts = find_batch_conflicts(&slots, &existing);

    let bucket = &state.bucket;
    let sub = user.sub.as_str();
    save_series(
        &sessions,
        move |session: Session| async move {
            records::save(bucket, &keys::session(sub, session.id), &session)
                .await
                .map(|_| ())
        },
        move |id| async move { bucket.delete(&keys::session(sub, id)).await },
    )
    .await?;

    info!(
        recurrence_id = %recurrence_id,
        sessions = sessions.len(),
        conflicts = conflicts.len(),
        "booked recurring sessions"
    );
    AuditEvent::new(AuditAction::Create, ResourceType::Session, recurrence_id, &user.sub)
        .with_details(serde_json::json!({
            "patient_id": patient.id,
            "recurrence": true,
            "sessions": sessions.len(),
        }))
        .emit();

    Ok(Json(BookedSeries {
        recurrence_id,
        sessions,
        conflicts,
    }))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(tenant::session(&state, &user, id).await?))
}

/// Move a session to another slot.
pub async fn update_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<RescheduleInput>,
) -> Result<Json<BookedSession>, ApiError> {
    let key = keys::session(&user.sub, id);
    let current = records::load_versioned::<Session>(&state.bucket, &key).await?;
    let mut session = current.value;

    let duration = input.duration_minutes.unwrap_or(session.duration_minutes);
    reschedule(&mut session, input.starts_at, duration, Timestamp::now())?;
    if let Some(modality) = input.modality {
        session.modality = modality;
    }

    let existing = tenant::sessions(&state, &user).await?;
    let conflicts = find_conflicts(session.starts_at, session.ends_at(), &existing, Some(id));
    records::save_if_match(&state.bucket, &key, &session, &current.etag).await?;

    AuditEvent::new(AuditAction::Update, ResourceType::Session, id, &user.sub)
        .with_details(serde_json::json!({ "rescheduled": true, "conflicts": conflicts.len() }))
        .emit();
    Ok(Json(BookedSession { session, conflicts }))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> Result<Json<Session>, ApiError> {
    let key = keys::session(&user.sub, id);
    let current = records::load_versioned::<Session>(&state.bucket, &key).await?;
    let mut session = current.value;
    let from = session.status;

    change_status(&mut session, change, Timestamp::now())?;
    records::save_if_match(&state.bucket, &key, &session, &current.etag).await?;

    AuditEvent::new(AuditAction::Update, ResourceType::Session, id, &user.sub)
        .with_details(serde_json::json!({ "from": from.as_str(), "to": session.status.as_str() }))
        .emit();
    Ok(Json(session))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(action): Json<PaymentAction>,
) -> Result<Json<Session>, ApiError> {
    let key = keys::session(&user.sub, id);
    let current = records::load_versioned::<Session>(&state.bucket, &key).await?;
    let mut session = current.value;

    apply_payment(&mut session, action, Timestamp::now())?;
    records::save_if_match(&state.bucket, &key, &session, &current.etag).await?;

    AuditEvent::new(AuditAction::Update, ResourceType::Session, id, &user.sub)
        .with_details(serde_json::json!({ "payment": session.payment.status }))
        .emit();
    Ok(Json(session))
}

/// Delete one session, or with `?scope=series` this session and the later
/// sessions of its recurrence. Completed sessions are part of the clinical
/// record and are never deleted here.
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeletedSessions>, ApiError> {
    let session = tenant::session(&state, &user, id).await?;
    if session.status == SessionStatus::Completed {
        return Err(ApiError::Conflict(
            "completed sessions cannot be deleted".to_string(),
        ));
    }

    let targets = match (query.scope, session.recurrence_id) {
        (DeleteScope::Series, Some(recurrence_id)) => {
            let all = tenant::sessions(&state, &user).await?;
            series_to_delete(&all, recurrence_id, session.starts_at)
        }
        _ => vec![session.id],
    };

    for target in &targets {
        tenant::remove_session(&state, &user, *target).await?;
    }

    AuditEvent::new(AuditAction::Delete, ResourceType::Session, id, &user.sub)
        .with_details(serde_json::json!({ "scope": query.scope, "deleted": targets.len() }))
        .emit();
    Ok(Json(DeletedSessions { deleted: targets }))
}

/// Sessions of `recurrence_id` starting at or after `from` that were not
/// completed.
pub fn series_to_delete(sessions: &[Session], recurrence_id: Uuid, from: Timestamp) -> Vec<Uuid> {
    let mut targets: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.recurrence_id == Some(recurrence_id))
        .filter(|s| s.starts_at >= from && s.status != SessionStatus::Completed)
        .collect();
    targets.sort_by_key(|s| s.starts_at);
    targets.into_iter().map(|s| s.id).collect()
}

/// Write a series one session at a time. When a write fails, the sessions
/// already written are deleted again so a retry does not duplicate them.
async fn save_series<W, WF, D, DF>(sessions: &[Session], mut write: W, mut delete: D) -> Result<(), ApiError>
where
    W: FnMut(Session) -> WF,
    WF: Future<Output = Result<(), StorageError>>,
    D: FnMut(Uuid) -> DF,
    DF: Future<Output = Result<(), StorageError>>,
{
    for (i, session) in sessions.iter().enumerate() {
        if let Err(err) = write(session.clone()).await {
            for written in &sessions[..i] {
                if let Err(cleanup) = delete(written.id).await {
                    warn!(session_id = %written.id, error = %cleanup, "could not remove partial series session");
                }
            }
            return Err(err.into());
        }
    }
    Ok(())
}
