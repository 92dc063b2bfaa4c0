use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Subscription {
    pub professional_id: String,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub current_period_end: Option<jiff::Timestamp>,
    pub updated_at: jiff::Timestamp,
}

impl Subscription {
    pub fn free(professional_id: impl Into<String>, now: jiff::Timestamp) -> Self {
        Self {
            professional_id: professional_id.into(),
            plan: Plan::Free,
            status: SubscriptionStatus::Active,
            customer_id: None,
            subscription_id: None,
            current_period_end: None,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Plan {
    Free,
    Pro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
    Incomplete,
}

/// Links a payment-provider customer back to the professional who owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerLink {
    pub customer_id: String,
    pub professional_id: String,
}
