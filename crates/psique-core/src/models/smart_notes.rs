use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// AI-generated structured summary of a session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SmartNotes {
    pub id: Uuid,
    pub session_id: Uuid,
    pub summary: String,
    #[serde(default)]
    pub main_themes: Vec<String>,
    #[serde(default)]
    pub interventions: Vec<String>,
    #[serde(default)]
    pub patient_progress: String,
    /// Statements that may indicate risk (self-harm, violence). Never
    /// silently dropped; the front end highlights them.
    #[serde(default)]
    pub risk_flags: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub transaction_id: Uuid,
    pub created_at: jiff::Timestamp,
}

/// The subset of [`SmartNotes`] the model is asked to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartNotesBody {
    pub summary: String,
    #[serde(default)]
    pub main_themes: Vec<String>,
    #[serde(default)]
    pub interventions: Vec<String>,
    #[serde(default)]
    pub patient_progress: String,
    #[serde(default)]
    pub risk_flags: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl SmartNotesBody {
    pub fn into_notes(
        self,
        session_id: Uuid,
        transaction_id: Uuid,
        created_at: jiff::Timestamp,
    ) -> SmartNotes {
        SmartNotes {
            id: Uuid::new_v4(),
            session_id,
            summary: self.summary,
            main_themes: self.main_themes,
            interventions: self.interventions,
            patient_progress: self.patient_progress,
            risk_flags: self.risk_flags,
            next_steps: self.next_steps,
            transaction_id,
            created_at,
        }
    }
}
