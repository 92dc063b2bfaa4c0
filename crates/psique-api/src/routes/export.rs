use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Extension;
use uuid::Uuid;

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_core::keys::sanitize_filename;
use psique_export::docx::generate_docx;
use psique_export::record::build_record;
use psique_export::render::render_clinical_record;
use psique_export::styles::DocumentStyles;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The patient's clinical record as a DOCX download.
pub async fn export_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = tenant::profile(&state, &user).await?;
    let tz = profile.time_zone()?;
    let patient = tenant::patient(&state, &user, patient_id).await?;
    let sessions = tenant::patient_sessions(&state, &user, patient_id).await?;
    let evolutions = tenant::patient_evolutions(&state, &user, patient_id).await?;

    let record = build_record(
        &profile,
        &patient,
        &sessions,
        &evolutions,
        &tz,
        tenant::today(&tz),
    );
    let rendered = render_clinical_record(&record)?;
    let bytes = generate_docx(&rendered, &DocumentStyles::default())?;

    AuditEvent::new(AuditAction::Export, ResourceType::Patient, patient_id, &user.sub)
        .with_details(serde_json::json!({ "format": "docx", "sessions": sessions.len() }))
        .emit();

    let filename = format!("prontuario-{}.docx", sanitize_filename(&patient.name));
    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    ))
}
