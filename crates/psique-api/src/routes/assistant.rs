use axum::extract::{Path, State};
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use psique_ai::chat::chat_converse;
use psique_ai::context::{assistant_system_prompt, build_patient_context};
use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::chat_history::{ChatHistory, ChatRole, MAX_STORED_MESSAGES};
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::me::load_instructions;
use crate::routes::tenant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssistantQuestion {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AssistantReply {
    pub reply: String,
    pub transaction_id: Uuid,
    pub history: ChatHistory,
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<ChatHistory>, ApiError> {
    tenant::patient(&state, &user, patient_id).await?;
    let history = records::load_optional(&state.bucket, &keys::chat_history(&user.sub, patient_id))
        .await?
        .unwrap_or_else(|| ChatHistory::new(patient_id, &state.config.model_id, Timestamp::now()));
    AuditEvent::new(AuditAction::Read, ResourceType::ChatHistory, patient_id, &user.sub).emit();
    Ok(Json(history))
}

/// One assistant turn about a patient. The question and answer are appended
/// to the stored conversation only when the model answered.
pub async fn ask(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Json(question): Json<AssistantQuestion>,
) -> Result<Json<AssistantReply>, ApiError> {
    tenant::current_entitlements(&state, &user).await?.require_ai()?;

    let tz = tenant::time_zone(&state, &user).await?;
    let patient = tenant::patient(&state, &user, patient_id).await?;
    let sessions = tenant::patient_sessions(&state, &user, patient_id).await?;
    let evolutions = tenant::patient_evolutions(&state, &user, patient_id).await?;
    let entries = tenant::evolution_entries(&evolutions, &sessions, &tz);
    let context = build_patient_context(&patient, &entries, tenant::today(&tz));
    let instructions = load_instructions(&state, &user.sub).await?;
    let system_prompt = assistant_system_prompt(&context, instructions.as_deref());

    let history_key = keys::chat_history(&user.sub, patient_id);
    let mut history = records::load_optional::<ChatHistory>(&state.bucket, &history_key)
        .await?
        .unwrap_or_else(|| ChatHistory::new(patient_id, &state.config.model_id, Timestamp::now()));

    let result = chat_converse(
        &state.bedrock,
        &state.config.model_id,
        patient_id,
        &system_prompt,
        &history.messages,
        &question.message,
    )
    .await?;

    let now = Timestamp::now();
    history.push(ChatRole::User, question.message.trim(), now);
    history.push(ChatRole::Assistant, result.output.clone(), now);
    history.keep_recent(MAX_STORED_MESSAGES);
    history.model_id = state.config.model_id.clone();
    records::save(&state.bucket, &history_key, &history).await?;
    records::save(
        &state.bucket,
        &keys::ai_transaction(&user.sub, result.transaction.id),
        &result.transaction,
    )
    .await?;

    AuditEvent::new(AuditAction::AiInvoke, ResourceType::ChatHistory, patient_id, &user.sub)
        .with_details(serde_json::json!({
            "kind": "assistant_chat",
            "transaction_id": result.transaction.id,
        }))
        .emit();

    Ok(Json(AssistantReply {
        reply: result.output,
        transaction_id: result.transaction.id,
        history,
    }))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<()>, ApiError> {
    state
        .bucket
        .delete(&keys::chat_history(&user.sub, patient_id))
        .await?;
    AuditEvent::new(AuditAction::Delete, ResourceType::ChatHistory, patient_id, &user.sub).emit();
    Ok(Json(()))
}
