//! Patient context for prompts.
//!
//! The block carries what a colleague would need to follow the case: the
//! patient's age and status, free-form notes and the most recent
//! evolutions. Contact details never leave the tenant's storage.

use jiff::civil::Date;

use psique_core::models::patient::{Patient, PatientStatus};
use psique_core::text::plain_text;

/// How many past evolutions are sent to the model.
pub const MAX_CONTEXT_EVOLUTIONS: usize = 5;

/// An evolution with the date of the session it belongs to.
#[derive(Debug, Clone)]
pub struct EvolutionEntry {
    pub date: Date,
    pub content: String,
}

pub fn build_patient_context(patient: &Patient, evolutions: &[EvolutionEntry], today: Date) -> String {
    let mut block = String::from("<patient_context>\n");

    block.push_str(&format!("<name>{}</name>\n", patient.name));
    if let Some(age) = patient.age_on(today) {
        block.push_str(&format!("<age>{age}</age>\n"));
    }
    let status = match patient.status {
        PatientStatus::Active => "em atendimento",
        PatientStatus::Inactive => "inativo",
        PatientStatus::Discharged => "alta",
    };
    block.push_str(&format!("<status>{status}</status>\n"));
    if let Some(notes) = patient.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        block.push_str(&format!("<notes>\n{}\n</notes>\n", notes.trim()));
    }

    let mut recent: Vec<&EvolutionEntry> = evolutions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(MAX_CONTEXT_EVOLUTIONS);
    recent.reverse();

    for entry in recent {
        let text = plain_text(&entry.content);
        if text.is_empty() {
            continue;
        }
        block.push_str(&format!("<evolution date=\"{}\">\n{text}\n</evolution>\n", entry.date));
    }

    block.push_str("</patient_context>");
    block
}

/// The assistant's system prompt with the patient block and any extra
/// instructions the professional configured.
pub fn assistant_system_prompt(context: &str, instructions: Option<&str>) -> String {
    let mut prompt = String::from(crate::prompts::ASSISTANT);
    if let Some(extra) = instructions.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(extra);
    }
    prompt.push_str("\n\n");
    prompt.push_str(context);
    prompt
}
