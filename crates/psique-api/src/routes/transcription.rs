use std::time::Duration;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::transcript::Transcript;
use psique_storage::bucket::ObjectMeta;
use psique_storage::records;
use psique_transcribe::{TranscribeOptions, media_format_for_key, transcribe_audio};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

const UPLOAD_URL_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Deserialize)]
pub struct AudioUploadRequest {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AudioUpload {
    pub audio_key: String,
    pub upload_url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscribeRequest {
    /// Defaults to the most recent upload for the session.
    #[serde(default)]
    pub audio_key: Option<String>,
}

/// Presigned URL for uploading a session recording.
pub async fn upload_audio(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<AudioUploadRequest>,
) -> Result<Json<AudioUpload>, ApiError> {
    tenant::current_entitlements(&state, &user).await?.require_ai()?;
    tenant::session(&state, &user, session_id).await?;

    let audio_key = keys::session_audio(&user.sub, session_id, &req.filename);
    // Reject formats Transcribe cannot read before anything is uploaded.
    media_format_for_key(&audio_key)?;

    let upload_url = state
        .bucket
        .presign_put(&audio_key, req.content_type.as_deref(), UPLOAD_URL_TTL)
        .await?;

    AuditEvent::new(AuditAction::Upload, ResourceType::Session, session_id, &user.sub)
        .with_details(serde_json::json!({ "kind": "audio" }))
        .emit();
    Ok(Json(AudioUpload {
        audio_key,
        upload_url,
    }))
}

/// Transcribe a session recording and store the transcript. Runs for as
/// long as the Transcribe job does; a failure is returned to the caller to
/// retry.
pub async fn transcribe(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
    body: Option<Json<TranscribeRequest>>,
) -> Result<Json<Transcript>, ApiError> {
    tenant::current_entitlements(&state, &user).await?.require_ai()?;
    tenant::session(&state, &user, session_id).await?;

    let prefix = keys::session_audio_prefix(&user.sub, session_id);
    let requested = body.and_then(|Json(b)| b.audio_key);
    let audio_key = match requested {
        Some(key) if key.starts_with(&prefix) => key,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "audio_key does not belong to this session".to_string(),
            ));
        }
        None => {
            let uploads = state.bucket.list_with_metadata(&prefix).await?;
            latest_upload(uploads)
                .ok_or_else(|| ApiError::NotFound("no audio uploaded for this session".to_string()))?
        }
    };
    let format = media_format_for_key(&audio_key)?;

    let options = TranscribeOptions {
        language: state.config.transcribe_language.clone(),
        max_speakers: state.config.transcribe_max_speakers,
        deadline: state.config.transcribe_deadline,
    };
    let output = transcribe_audio(&state.aws, &state.bucket, &audio_key, format, &options).await?;
    let transcript = output.into_transcript(session_id, audio_key, Timestamp::now());

    records::save(&state.bucket, &keys::transcript(&user.sub, session_id), &transcript).await?;

    AuditEvent::new(AuditAction::Transcribe, ResourceType::Transcript, session_id, &user.sub)
        .with_details(serde_json::json!({ "segments": transcript.segments.len() }))
        .emit();
    Ok(Json(transcript))
}

pub async fn get_transcription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Transcript>, ApiError> {
    let transcript: Transcript =
        records::load(&state.bucket, &keys::transcript(&user.sub, session_id)).await?;
    AuditEvent::new(AuditAction::Read, ResourceType::Transcript, session_id, &user.sub).emit();
    Ok(Json(transcript))
}

/// Key of the most recently modified upload. Ties fall back to key order so
/// the choice is stable.
pub fn latest_upload(uploads: Vec<ObjectMeta>) -> Option<String> {
    uploads
        .into_iter()
        .filter(|o| o.size > 0)
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
        .map(|o| o.key)
}
