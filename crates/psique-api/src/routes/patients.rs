use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::patient::{Patient, PatientInput, PatientStatus};
use psique_core::models::session::Session;
use psique_core::text::{fold, matches_query};
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub status: Option<PatientStatus>,
    /// Name filter, case and accent insensitive.
    pub q: Option<String>,
}

pub async fn list_patients(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let patients = tenant::patients(&state, &user).await?;
    Ok(Json(filter_patients(patients, &query)))
}

/// Apply the list filters and sort by name the way a reader expects
/// ("Álvaro" next to "Alice", not after "Zé").
pub fn filter_patients(mut patients: Vec<Patient>, query: &PatientQuery) -> Vec<Patient> {
    patients.retain(|p| {
        query.status.is_none_or(|status| p.status == status)
            && query.q.as_deref().is_none_or(|q| matches_query(&p.name, q))
    });
    patients.sort_by_cached_key(|p| fold(&p.name));
    patients
}

/// Fails with 402 when one more active patient would exceed the plan.
async fn check_active_limit(state: &AppState, user: &AuthUser) -> Result<(), ApiError> {
    let limits = tenant::current_entitlements(state, user).await?;
    if limits.max_active_patients.is_none() {
        return Ok(());
    }
    let active = tenant::patients(state, user)
        .await?
        .iter()
        .filter(|p| p.is_active())
        .count();
    limits.check_new_active_patient(u32::try_from(active).unwrap_or(u32::MAX))?;
    Ok(())
}

pub async fn create_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<PatientInput>,
) -> Result<Json<Patient>, ApiError> {
    input.validate()?;
    if input.activates(None) {
        check_active_limit(&state, &user).await?;
    }

    let patient = Patient::from_input(&user.sub, input, Timestamp::now());
    records::save(&state.bucket, &keys::patient(&user.sub, patient.id), &patient).await?;

    AuditEvent::new(AuditAction::Create, ResourceType::Patient, patient.id, &user.sub).emit();
    Ok(Json(patient))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let patient = tenant::patient(&state, &user, id).await?;
    AuditEvent::new(AuditAction::Read, ResourceType::Patient, id, &user.sub).emit();
    Ok(Json(patient))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<PatientInput>,
) -> Result<Json<Patient>, ApiError> {
    input.validate()?;
    let key = keys::patient(&user.sub, id);
    let current = records::load_versioned::<Patient>(&state.bucket, &key).await?;
    let mut patient = current.value;

    if !patient.is_active() && input.activates(Some(patient.status)) {
        check_active_limit(&state, &user).await?;
    }

    patient.apply(input, Timestamp::now());
    records::save_if_match(&state.bucket, &key, &patient, &current.etag).await?;

    AuditEvent::new(AuditAction::Update, ResourceType::Patient, id, &user.sub).emit();
    Ok(Json(patient))
}

#[derive(Debug, Serialize)]
pub struct DeletedPatient {
    pub id: Uuid,
    pub sessions: usize,
    pub documents: usize,
}

/// Delete a patient with their sessions, session records, documents and
/// assistant conversation.
pub async fn delete_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedPatient>, ApiError> {
    // 404 before touching anything else.
    tenant::patient(&state, &user, id).await?;

    let sessions = tenant::patient_sessions(&state, &user, id).await?;
    for session in &sessions {
        tenant::remove_session(&state, &user, session.id).await?;
    }
    let documents = state
        .bucket
        .delete_prefix(&keys::document_meta_prefix(&user.sub, id))
        .await?;
    state
        .bucket
        .delete_prefix(&keys::documents_prefix(&user.sub, id))
        .await?;
    state.bucket.delete(&keys::chat_history(&user.sub, id)).await?;
    state.bucket.delete(&keys::patient(&user.sub, id)).await?;

    info!(patient_id = %id, sessions = sessions.len(), documents, "deleted patient");
    AuditEvent::new(AuditAction::Delete, ResourceType::Patient, id, &user.sub)
        .with_details(serde_json::json!({ "sessions": sessions.len(), "documents": documents }))
        .emit();

    Ok(Json(DeletedPatient {
        id,
        sessions: sessions.len(),
        documents,
    }))
}

pub async fn list_patient_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Session>>, ApiError> {
    tenant::patient(&state, &user, id).await?;
    Ok(Json(tenant::patient_sessions(&state, &user, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(name: &str, status: PatientStatus) -> Patient {
        let mut p = Patient::from_input(
            "pro",
            PatientInput {
                name: name.into(),
                email: None,
                phone: None,
                birth_date: None,
                status: Some(status),
                session_price_cents: None,
                emergency_contact: None,
                notes: None,
            },
            Timestamp::UNIX_EPOCH,
        );
        p.id = Uuid::new_v4();
        p
    }

    fn names(patients: &[Patient]) -> Vec<&str> {
        patients.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn name_filter_ignores_accents_and_case() {
        let all = vec![
            patient("João Pereira", PatientStatus::Active),
            patient("Joana Dias", PatientStatus::Active),
            patient("Mário Souza", PatientStatus::Inactive),
        ];
        let query = PatientQuery {
            status: None,
            q: Some("JOAO".into()),
        };
        assert_eq!(names(&filter_patients(all, &query)), vec!["João Pereira"]);
    }

    #[test]
    fn status_filter_and_folded_sort() {
        let all = vec![
            patient("Zé Carlos", PatientStatus::Active),
            patient("Álvaro Lima", PatientStatus::Active),
            patient("Alice Rocha", PatientStatus::Discharged),
            patient("Beatriz Melo", PatientStatus::Active),
        ];
        let active = filter_patients(
            all.clone(),
            &PatientQuery {
                status: Some(PatientStatus::Active),
                q: None,
            },
        );
        assert_eq!(names(&active), vec!["Álvaro Lima", "Beatriz Melo", "Zé Carlos"]);

        let everyone = filter_patients(all, &PatientQuery::default());
        assert_eq!(everyone[0].name, "Alice Rocha");
        assert_eq!(everyone[1].name, "Álvaro Lima");
    }
}
