use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A file attached to a patient's record (referrals, reports, consent forms).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientDocument {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: Option<i64>,
    pub key: String,
    pub uploaded_at: jiff::Timestamp,
}
