//! The data a clinical record export is rendered from.

use std::collections::HashMap;

use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use uuid::Uuid;

use psique_core::models::evolution::Evolution;
use psique_core::models::patient::{Patient, PatientStatus};
use psique_core::models::professional::Professional;
use psique_core::models::session::{Modality, Session, SessionStatus};
use psique_core::text::plain_text;

#[derive(Debug, Clone, Serialize)]
pub struct ClinicalRecord {
    pub professional: RecordProfessional,
    pub patient: RecordPatient,
    pub sessions: Vec<RecordSession>,
    /// Completed sessions.
    pub attended: usize,
    pub generated_on: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordProfessional {
    pub name: String,
    pub license_number: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordPatient {
    pub name: String,
    pub birth_date: Option<String>,
    pub age: Option<i16>,
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordSession {
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    pub modality: &'static str,
    pub status: &'static str,
    pub cancellation_reason: Option<String>,
    pub evolution: Option<String>,
}

/// Assemble the record of `patient`. Sessions of other patients are
/// ignored; the rest are listed oldest first with their evolution text.
pub fn build_record(
    professional: &Professional,
    patient: &Patient,
    sessions: &[Session],
    evolutions: &[Evolution],
    tz: &TimeZone,
    today: Date,
) -> ClinicalRecord {
    let evolutions: HashMap<Uuid, &Evolution> =
        evolutions.iter().map(|e| (e.session_id, e)).collect();

    let mut own: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.patient_id == patient.id)
        .collect();
    own.sort_by_key(|s| s.starts_at);

    let sessions: Vec<RecordSession> = own
        .into_iter()
        .map(|s| {
            let local = s.starts_at.to_zoned(tz.clone());
            RecordSession {
                date: local.strftime("%d/%m/%Y").to_string(),
                time: local.strftime("%H:%M").to_string(),
                duration_minutes: s.duration_minutes,
                modality: modality_label(s.modality),
                status: session_status_label(s.status),
                cancellation_reason: s.cancellation_reason.clone(),
                evolution: evolutions
                    .get(&s.id)
                    .map(|e| plain_text(&e.content))
                    .filter(|text| !text.is_empty()),
            }
        })
        .collect();

    ClinicalRecord {
        professional: RecordProfessional {
            name: professional.name.clone(),
            license_number: professional.license_number.clone(),
            specialty: professional.specialty.clone(),
        },
        patient: RecordPatient {
            name: patient.name.clone(),
            birth_date: patient
                .birth_date
                .map(|d| d.strftime("%d/%m/%Y").to_string()),
            age: patient.age_on(today),
            status: patient_status_label(patient.status),
        },
        attended: sessions
            .iter()
            .filter(|s| s.status == session_status_label(SessionStatus::Completed))
            .count(),
        sessions,
        generated_on: today.strftime("%d/%m/%Y").to_string(),
    }
}

fn session_status_label(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Scheduled => "Agendada",
        SessionStatus::Confirmed => "Confirmada",
        SessionStatus::Completed => "Realizada",
        SessionStatus::Cancelled => "Cancelada",
        SessionStatus::NoShow => "Falta",
    }
}

fn patient_status_label(status: PatientStatus) -> &'static str {
    match status {
        PatientStatus::Active => "Em atendimento",
        PatientStatus::Inactive => "Inativo",
        PatientStatus::Discharged => "Alta",
    }
}

fn modality_label(modality: Modality) -> &'static str {
    match modality {
        Modality::InPerson => "presencial",
        Modality::Online => "online",
    }
}
