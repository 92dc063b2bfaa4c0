use std::time::Duration;

use axum::extract::{Path, State};
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys;
use psique_core::models::document::PatientDocument;
use psique_storage::error::StorageError;
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

const UPLOAD_URL_TTL: Duration = Duration::from_secs(15 * 60);
const DOWNLOAD_URL_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Deserialize)]
pub struct NewDocument {
    pub filename: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentUpload {
    pub document: PatientDocument,
    pub upload_url: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentDownload {
    pub document: PatientDocument,
    pub download_url: String,
}

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<PatientDocument>>, ApiError> {
    let mut documents: Vec<PatientDocument> = records::load_all(
        &state.bucket,
        &keys::document_meta_prefix(&user.sub, patient_id),
    )
    .await?;
    documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    Ok(Json(documents))
}

/// Register a document and hand back a presigned URL the browser uploads to.
pub async fn create_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<NewDocument>,
) -> Result<Json<DocumentUpload>, ApiError> {
    if req.filename.trim().is_empty() {
        return Err(ApiError::BadRequest("filename is required".to_string()));
    }
    tenant::patient(&state, &user, patient_id).await?;

    let id = Uuid::new_v4();
    let key = keys::document_file(&user.sub, patient_id, id, &req.filename);
    let document = PatientDocument {
        id,
        patient_id,
        filename: req.filename.trim().to_string(),
        content_type: req.content_type,
        size_bytes: None,
        key,
        uploaded_at: Timestamp::now(),
    };
    let upload_url = state
        .bucket
        .presign_put(&document.key, Some(&document.content_type), UPLOAD_URL_TTL)
        .await?;
    records::save(
        &state.bucket,
        &keys::document_meta(&user.sub, patient_id, id),
        &document,
    )
    .await?;

    AuditEvent::new(AuditAction::Upload, ResourceType::Document, id, &user.sub)
        .with_details(serde_json::json!({ "patient_id": patient_id }))
        .emit();
    Ok(Json(DocumentUpload {
        document,
        upload_url,
    }))
}

/// Document metadata plus a short-lived download URL. The size is filled in
/// the first time the uploaded file is seen.
pub async fn get_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((patient_id, doc_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DocumentDownload>, ApiError> {
    let meta_key = keys::document_meta(&user.sub, patient_id, doc_id);
    let mut document: PatientDocument = records::load(&state.bucket, &meta_key).await?;

    if document.size_bytes.is_none() {
        match state.bucket.head_size(&document.key).await {
            Ok(size) => {
                document.size_bytes = Some(size);
                records::save(&state.bucket, &meta_key, &document).await?;
            }
            Err(StorageError::NotFound { .. }) => {
                return Err(ApiError::NotFound("document was never uploaded".to_string()));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let download_url = state.bucket.presign_get(&document.key, DOWNLOAD_URL_TTL).await?;

    AuditEvent::new(AuditAction::Read, ResourceType::Document, doc_id, &user.sub).emit();
    Ok(Json(DocumentDownload {
        document,
        download_url,
    }))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((patient_id, doc_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<()>, ApiError> {
    let meta_key = keys::document_meta(&user.sub, patient_id, doc_id);
    let document: PatientDocument = records::load(&state.bucket, &meta_key).await?;
    state.bucket.delete(&document.key).await?;
    state.bucket.delete(&meta_key).await?;

    AuditEvent::new(AuditAction::Delete, ResourceType::Document, doc_id, &user.sub).emit();
    Ok(Json(()))
}
