use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::models::session::validate_price;

pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
pub const DEFAULT_SESSION_MINUTES: u32 = 50;

/// A psychologist using the system. Every professional is one tenant; the
/// `id` is the identity provider's subject claim.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Professional {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Council registration number (CRP).
    pub license_number: Option<String>,
    pub specialty: Option<String>,
    /// IANA time zone used to lay out the calendar.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_session_minutes")]
    pub default_session_minutes: u32,
    #[serde(default)]
    pub default_price_cents: i64,
    /// Calendar weeks start on Monday instead of Sunday.
    #[serde(default)]
    pub week_starts_monday: bool,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Professional {
    /// A fresh profile for a professional seen for the first time.
    pub fn new(id: impl Into<String>, email: impl Into<String>, now: jiff::Timestamp) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: email.into(),
            license_number: None,
            specialty: None,
            timezone: default_timezone(),
            default_session_minutes: DEFAULT_SESSION_MINUTES,
            default_price_cents: 0,
            week_starts_monday: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn time_zone(&self) -> Result<jiff::tz::TimeZone, jiff::Error> {
        jiff::tz::TimeZone::get(&self.timezone)
    }

    pub fn apply(&mut self, input: ProfessionalInput, now: jiff::Timestamp) {
        self.name = input.name.trim().to_string();
        self.license_number = input.license_number;
        self.specialty = input.specialty;
        self.timezone = input.timezone;
        self.default_session_minutes = input.default_session_minutes;
        self.default_price_cents = input.default_price_cents;
        self.week_starts_monday = input.week_starts_monday;
        self.updated_at = now;
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfessionalInput {
    pub name: String,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_session_minutes")]
    pub default_session_minutes: u32,
    #[serde(default)]
    pub default_price_cents: i64,
    #[serde(default)]
    pub week_starts_monday: bool,
}

impl ProfessionalInput {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::MissingField("name".to_string()));
        }
        if jiff::tz::TimeZone::get(&self.timezone).is_err() {
            return Err(CoreError::InvalidField {
                field: "timezone".to_string(),
                reason: format!("unknown time zone {}", self.timezone),
            });
        }
        if self.default_session_minutes == 0 || self.default_session_minutes > 8 * 60 {
            return Err(CoreError::InvalidField {
                field: "default_session_minutes".to_string(),
                reason: "must be between 1 and 480".to_string(),
            });
        }
        validate_price("default_price_cents", self.default_price_cents)
    }
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_session_minutes() -> u32 {
    DEFAULT_SESSION_MINUTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_defaults_are_filled_on_deserialize() {
        let json = r#"{
            "id": "abc",
            "name": "Ana",
            "email": "ana@example.com",
            "license_number": null,
            "specialty": null,
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }"#;
        let p: Professional = serde_json::from_str(json).unwrap();
        assert_eq!(p.timezone, DEFAULT_TIMEZONE);
        assert_eq!(p.default_session_minutes, 50);
        assert_eq!(p.default_price_cents, 0);
        assert!(p.time_zone().is_ok());
        assert!(!p.week_starts_monday);
    }

    #[test]
    fn input_validation() {
        let mut input = ProfessionalInput {
            name: "Ana".to_string(),
            license_number: None,
            specialty: None,
            timezone: "America/Manaus".to_string(),
            default_session_minutes: 50,
            default_price_cents: 15_000,
            week_starts_monday: true,
        };
        assert!(input.validate().is_ok());

        input.timezone = "Mars/Olympus".to_string();
        assert!(matches!(input.validate(), Err(CoreError::InvalidField { .. })));

        input.timezone = DEFAULT_TIMEZONE.to_string();
        input.name = " ".to_string();
        assert!(matches!(input.validate(), Err(CoreError::MissingField(_))));

        input.name = "Ana".to_string();
        input.default_price_cents = i64::MAX;
        assert!(matches!(input.validate(), Err(CoreError::InvalidField { .. })));
    }
}
