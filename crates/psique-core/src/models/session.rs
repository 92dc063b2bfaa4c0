use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::CoreError;

/// Highest price accepted for one session (R$ 1.000.000,00).
pub const MAX_PRICE_CENTS: i64 = 100_000_000;

/// Reject negative prices and prices above [`MAX_PRICE_CENTS`].
pub fn validate_price(field: &str, price_cents: i64) -> Result<(), CoreError> {
    if !(0..=MAX_PRICE_CENTS).contains(&price_cents) {
        return Err(CoreError::InvalidField {
            field: field.to_string(),
            reason: format!("must be between 0 and {MAX_PRICE_CENTS}"),
        });
    }
    Ok(())
}

/// A scheduled appointment between a professional and a patient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    pub id: Uuid,
    pub professional_id: String,
    pub patient_id: Uuid,
    pub starts_at: jiff::Timestamp,
    pub duration_minutes: u32,
    pub modality: Modality,
    pub status: SessionStatus,
    pub payment: SessionPayment,
    /// Shared by every session generated from the same recurrence rule.
    pub recurrence_id: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Session {
    pub fn ends_at(&self) -> jiff::Timestamp {
        self.starts_at
            .checked_add(jiff::SignedDuration::from_mins(i64::from(self.duration_minutes)))
            .unwrap_or(self.starts_at)
    }

    /// Whether the session still occupies its slot in the agenda.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self.status, SessionStatus::Cancelled | SessionStatus::NoShow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SessionStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Confirmed => "confirmed",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::NoShow => "no_show",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Modality {
    InPerson,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionPayment {
    pub status: PaymentStatus,
    pub price_cents: i64,
    pub method: Option<PaymentMethod>,
    pub paid_at: Option<jiff::Timestamp>,
}

impl SessionPayment {
    pub fn pending(price_cents: i64) -> Self {
        Self {
            status: PaymentStatus::Pending,
            price_cents,
            method: None,
            paid_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Waived,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    Pix,
    Cash,
    Card,
    Transfer,
    Insurance,
}

/// Fields a client sends to book a single session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionInput {
    pub patient_id: Uuid,
    pub starts_at: jiff::Timestamp,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub modality: Option<Modality>,
    #[serde(default)]
    pub price_cents: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_are_bounded() {
        assert!(validate_price("price_cents", 0).is_ok());
        assert!(validate_price("price_cents", MAX_PRICE_CENTS).is_ok());
        assert!(validate_price("price_cents", -1).is_err());
        assert!(validate_price("price_cents", MAX_PRICE_CENTS + 1).is_err());
        assert!(validate_price("price_cents", i64::MAX).is_err());
    }
}
