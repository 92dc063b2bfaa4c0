use axum::extract::{Path, State};
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use psique_ai::notes::draft_evolution;
use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::ai_transaction::AiTransaction;
use psique_core::models::evolution::Evolution;
use psique_core::models::session::Session;
use psique_core::models::smart_notes::SmartNotes;
use psique_core::text::sanitize_rich_text;
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvolutionInput {
    pub content: String,
    #[serde(default)]
    pub smart_notes_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct EvolutionDraft {
    pub draft: String,
    pub transaction: AiTransaction,
}

pub async fn get_evolution(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Evolution>, ApiError> {
    let evolution: Evolution =
        records::load(&state.bucket, &keys::evolution(&user.sub, session_id)).await?;
    AuditEvent::new(AuditAction::Read, ResourceType::Evolution, session_id, &user.sub).emit();
    Ok(Json(evolution))
}

/// Create or replace the evolution of a session.
pub async fn put_evolution(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
    Json(input): Json<EvolutionInput>,
) -> Result<Json<Evolution>, ApiError> {
    let session = tenant::session(&state, &user, session_id).await?;
    let key = keys::evolution(&user.sub, session_id);
    let now = Timestamp::now();

    let existing = records::load_optional::<Evolution>(&state.bucket, &key).await?;
    let action = if existing.is_some() {
        AuditAction::Update
    } else {
        AuditAction::Create
    };
    let evolution = Evolution {
        session_id,
        patient_id: session.patient_id,
        content: sanitize_rich_text(&input.content),
        smart_notes_id: input
            .smart_notes_id
            .or_else(|| existing.as_ref().and_then(|e| e.smart_notes_id)),
        created_at: existing.as_ref().map_or(now, |e| e.created_at),
        updated_at: now,
    };
    records::save(&state.bucket, &key, &evolution).await?;

    AuditEvent::new(action, ResourceType::Evolution, session_id, &user.sub).emit();
    Ok(Json(evolution))
}

/// Draft the evolution of a session from its SmartNotes. The draft is
/// returned for review, not saved as the evolution.
pub async fn draft(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<EvolutionDraft>, ApiError> {
    tenant::current_entitlements(&state, &user).await?.require_ai()?;

    let session = tenant::session(&state, &user, session_id).await?;
    let notes: SmartNotes = records::load_optional(&state.bucket, &keys::smart_notes(&user.sub, session_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("generate SmartNotes for this session first".to_string()))?;

    let sessions = tenant::patient_sessions(&state, &user, session.patient_id).await?;
    let evolutions = tenant::patient_evolutions(&state, &user, session.patient_id).await?;
    let previous = previous_evolution(&session, &sessions, &evolutions);

    let result = draft_evolution(
        &state.bedrock,
        &state.config.model_id,
        &notes,
        previous.map(|e| e.content.as_str()),
    )
    .await?;

    records::save(
        &state.bucket,
        &keys::ai_transaction(&user.sub, result.transaction.id),
        &result.transaction,
    )
    .await?;
    AuditEvent::new(AuditAction::AiInvoke, ResourceType::Evolution, session_id, &user.sub)
        .with_details(serde_json::json!({
            "kind": "evolution_draft",
            "transaction_id": result.transaction.id,
        }))
        .emit();

    Ok(Json(EvolutionDraft {
        draft: result.output,
        transaction: result.transaction,
    }))
}

/// The evolution of the latest earlier session of the same patient.
pub fn previous_evolution<'a>(
    session: &Session,
    sessions: &[Session],
    evolutions: &'a [Evolution],
) -> Option<&'a Evolution> {
    let mut earlier: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.patient_id == session.patient_id && s.starts_at < session.starts_at)
        .collect();
    earlier.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
    earlier
        .into_iter()
        .find_map(|s| evolutions.iter().find(|e| e.session_id == s.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use psique_core::models::session::{Modality, SessionPayment, SessionStatus};

    fn session_at(days: i64) -> Session {
        let starts_at = Timestamp::UNIX_EPOCH
            .checked_add(SignedDuration::from_hours(24 * days))
            .unwrap();
        Session {
            id: Uuid::new_v4(),
            professional_id: "p".into(),
            patient_id: Uuid::from_u128(3),
            starts_at,
            duration_minutes: 50,
            modality: Modality::InPerson,
            status: SessionStatus::Completed,
            payment: SessionPayment::pending(0),
            recurrence_id: None,
            cancellation_reason: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn evolution(session: &Session, text: &str) -> Evolution {
        Evolution {
            session_id: session.id,
            patient_id: session.patient_id,
            content: text.into(),
            smart_notes_id: None,
            created_at: session.starts_at,
            updated_at: session.starts_at,
        }
    }

    #[test]
    fn previous_evolution_skips_sessions_without_notes() {
        let first = session_at(1);
        let second = session_at(8);
        let third = session_at(15);
        let current = session_at(22);
        let later = session_at(29);
        let evolutions = vec![
            evolution(&first, "primeira"),
            evolution(&second, "segunda"),
            evolution(&later, "futura"),
        ];
        let sessions = vec![first, second, third, current.clone(), later];

        let found = previous_evolution(&current, &sessions, &evolutions).unwrap();
        // `third` has no evolution, so the one before it is used.
        assert_eq!(found.content, "segunda");
    }

    #[test]
    fn first_session_has_no_previous_evolution() {
        let first = session_at(1);
        assert!(previous_evolution(&first, &[first.clone()], &[]).is_none());
    }
}
