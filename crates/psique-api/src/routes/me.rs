use axum::extract::State;
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::professional::{Professional, ProfessionalInput};
use psique_storage::error::StorageError;
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

/// Longest custom instruction block accepted for the assistant.
const MAX_INSTRUCTIONS_CHARS: usize = 4000;

pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Professional>, ApiError> {
    Ok(Json(tenant::profile(&state, &user).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<ProfessionalInput>,
) -> Result<Json<Professional>, ApiError> {
    input.validate()?;
    let mut profile = tenant::profile(&state, &user).await?;
    profile.apply(input, Timestamp::now());
    records::save(&state.bucket, &keys::profile(&user.sub), &profile).await?;

    AuditEvent::new(AuditAction::Update, ResourceType::Professional, &user.sub, &user.sub).emit();
    Ok(Json(profile))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantInstructions {
    pub instructions: String,
}

pub async fn get_assistant_instructions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AssistantInstructions>, ApiError> {
    let instructions = load_instructions(&state, &user.sub).await?.unwrap_or_default();
    Ok(Json(AssistantInstructions { instructions }))
}

pub async fn put_assistant_instructions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<AssistantInstructions>,
) -> Result<Json<AssistantInstructions>, ApiError> {
    let instructions = body.instructions.trim().to_string();
    if instructions.chars().count() > MAX_INSTRUCTIONS_CHARS {
        return Err(ApiError::BadRequest(format!(
            "instructions must be at most {MAX_INSTRUCTIONS_CHARS} characters"
        )));
    }
    let key = keys::assistant_instructions(&user.sub);
    if instructions.is_empty() {
        state.bucket.delete(&key).await?;
    } else {
        state
            .bucket
            .put(&key, instructions.clone().into_bytes(), Some("text/markdown"))
            .await?;
    }

    AuditEvent::new(AuditAction::Update, ResourceType::Professional, &user.sub, &user.sub)
        .with_details(serde_json::json!({ "field": "assistant_instructions" }))
        .emit();
    Ok(Json(AssistantInstructions { instructions }))
}

/// The professional's extra assistant instructions, if any were saved.
pub async fn load_instructions(state: &AppState, professional_id: &str) -> Result<Option<String>, ApiError> {
    match state
        .bucket
        .get(&keys::assistant_instructions(professional_id))
        .await
    {
        Ok(fetched) => Ok(Some(String::from_utf8_lossy(&fetched.body).into_owned())),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
