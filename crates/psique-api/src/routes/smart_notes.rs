use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use psique_ai::context::build_patient_context;
use psique_ai::notes::generate_smart_notes;
use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::smart_notes::SmartNotes;
use psique_core::models::transcript::Transcript;
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

/// Summarise the session's transcript into SmartNotes, replacing any
/// earlier notes for the session.
pub async fn generate(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SmartNotes>, ApiError> {
    tenant::current_entitlements(&state, &user).await?.require_ai()?;

    let tz = tenant::time_zone(&state, &user).await?;
    let session = tenant::session(&state, &user, session_id).await?;
    let transcript: Transcript = records::load_optional(&state.bucket, &keys::transcript(&user.sub, session_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("transcribe the session audio first".to_string()))?;

    let patient = tenant::patient(&state, &user, session.patient_id).await?;
    let sessions = tenant::patient_sessions(&state, &user, patient.id).await?;
    let evolutions = tenant::patient_evolutions(&state, &user, patient.id).await?;
    // The session being summarised is not its own history.
    let history: Vec<_> = evolutions
        .into_iter()
        .filter(|e| e.session_id != session_id)
        .collect();
    let entries = tenant::evolution_entries(&history, &sessions, &tz);
    let context = build_patient_context(&patient, &entries, tenant::today(&tz));

    let result = generate_smart_notes(&state.bedrock, &state.config.model_id, &transcript, &context).await?;

    records::save(
        &state.bucket,
        &keys::ai_transaction(&user.sub, result.transaction.id),
        &result.transaction,
    )
    .await?;
    records::save(&state.bucket, &keys::smart_notes(&user.sub, session_id), &result.output).await?;

    AuditEvent::new(AuditAction::AiInvoke, ResourceType::SmartNotes, session_id, &user.sub)
        .with_details(serde_json::json!({
            "kind": "smart_notes",
            "transaction_id": result.transaction.id,
            "risk_flags": result.output.risk_flags.len(),
        }))
        .emit();
    Ok(Json(result.output))
}

pub async fn get_smart_notes(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SmartNotes>, ApiError> {
    let notes: SmartNotes =
        records::load(&state.bucket, &keys::smart_notes(&user.sub, session_id)).await?;
    AuditEvent::new(AuditAction::Read, ResourceType::SmartNotes, session_id, &user.sub).emit();
    Ok(Json(notes))
}
