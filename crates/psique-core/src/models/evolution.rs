use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// The clinical progress note ("evolução") written for a session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Evolution {
    pub session_id: Uuid,
    pub patient_id: Uuid,
    /// Rich-text body as produced by the editor.
    pub content: String,
    /// SmartNotes the text was drafted from, if any.
    pub smart_notes_id: Option<Uuid>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}
