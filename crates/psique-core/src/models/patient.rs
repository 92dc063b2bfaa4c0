use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::session::validate_price;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Patient {
    pub id: Uuid,
    pub professional_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<jiff::civil::Date>,
    pub status: PatientStatus,
    /// Per-patient price; falls back to the professional's default when absent.
    pub session_price_cents: Option<i64>,
    pub emergency_contact: Option<EmergencyContact>,
    pub notes: Option<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PatientStatus {
    Active,
    Inactive,
    Discharged,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: Option<String>,
}

/// Fields a client may set when creating or updating a patient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_date: Option<jiff::civil::Date>,
    #[serde(default)]
    pub status: Option<PatientStatus>,
    #[serde(default)]
    pub session_price_cents: Option<i64>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PatientInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::MissingField("name".to_string()));
        }
        if let Some(price) = self.session_price_cents {
            validate_price("session_price_cents", price)?;
        }
        Ok(())
    }

    /// Whether saving this input leaves the patient active.
    pub fn activates(&self, current: Option<PatientStatus>) -> bool {
        self.status.or(current).unwrap_or(PatientStatus::Active) == PatientStatus::Active
    }
}

impl Patient {
    pub fn from_input(
        professional_id: &str,
        input: PatientInput,
        now: jiff::Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            professional_id: professional_id.to_string(),
            name: input.name.trim().to_string(),
            email: input.email,
            phone: input.phone,
            birth_date: input.birth_date,
            status: input.status.unwrap_or(PatientStatus::Active),
            session_price_cents: input.session_price_cents,
            emergency_contact: input.emergency_contact,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite editable fields, keeping identity and creation time.
    pub fn apply(&mut self, input: PatientInput, now: jiff::Timestamp) {
        self.name = input.name.trim().to_string();
        self.email = input.email;
        self.phone = input.phone;
        self.birth_date = input.birth_date;
        if let Some(status) = input.status {
            self.status = status;
        }
        self.session_price_cents = input.session_price_cents;
        self.emergency_contact = input.emergency_contact;
        self.notes = input.notes;
        self.updated_at = now;
    }

    pub fn is_active(&self) -> bool {
        self.status == PatientStatus::Active
    }

    /// Age in whole years on `today`, if a birth date is known.
    pub fn age_on(&self, today: jiff::civil::Date) -> Option<i16> {
        let birth = self.birth_date?;
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        Some(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn input(name: &str) -> PatientInput {
        PatientInput {
            name: name.to_string(),
            email: None,
            phone: None,
            birth_date: Some(date(1990, 6, 15)),
            status: None,
            session_price_cents: None,
            emergency_contact: None,
            notes: None,
        }
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(matches!(input("  ").validate(), Err(CoreError::MissingField(_))));
        let mut priced = input("Maria");
        priced.session_price_cents = Some(-1);
        assert!(priced.validate().is_err());
        priced.session_price_cents = Some(i64::MAX);
        assert!(priced.validate().is_err());
    }

    #[test]
    fn activation_considers_current_status() {
        let mut i = input("Maria");
        assert!(i.activates(None));
        assert!(!i.activates(Some(PatientStatus::Inactive)));
        i.status = Some(PatientStatus::Active);
        assert!(i.activates(Some(PatientStatus::Inactive)));
    }

    #[test]
    fn new_patients_default_to_active() {
        let p = Patient::from_input("pro-1", input("  Maria Souza "), jiff::Timestamp::UNIX_EPOCH);
        assert_eq!(p.name, "Maria Souza");
        assert!(p.is_active());
        assert_eq!(p.professional_id, "pro-1");
    }

    #[test]
    fn apply_keeps_status_when_not_given() {
        let mut p = Patient::from_input("pro-1", input("Maria"), jiff::Timestamp::UNIX_EPOCH);
        p.status = PatientStatus::Discharged;
        p.apply(input("Maria S."), jiff::Timestamp::UNIX_EPOCH);
        assert_eq!(p.status, PatientStatus::Discharged);
        assert_eq!(p.name, "Maria S.");
    }

    #[test]
    fn age_counts_birthday_not_yet_reached() {
        let p = Patient::from_input("pro-1", input("Maria"), jiff::Timestamp::UNIX_EPOCH);
        assert_eq!(p.age_on(date(2026, 6, 14)), Some(35));
        assert_eq!(p.age_on(date(2026, 6, 15)), Some(36));
    }
}
