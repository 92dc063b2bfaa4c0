use serde::Serialize;
use ts_rs::TS;

use psique_core::models::subscription::{Plan, Subscription, SubscriptionStatus};

use crate::error::BillingError;

/// Active patients allowed on the free plan.
pub const FREE_MAX_ACTIVE_PATIENTS: u32 = 10;

/// What a professional may currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Entitlements {
    pub plan: Plan,
    /// `None` means unlimited.
    pub max_active_patients: Option<u32>,
    pub ai_enabled: bool,
}

impl Entitlements {
    pub const FREE: Entitlements = Entitlements {
        plan: Plan::Free,
        max_active_patients: Some(FREE_MAX_ACTIVE_PATIENTS),
        ai_enabled: false,
    };

    pub const PRO: Entitlements = Entitlements {
        plan: Plan::Pro,
        max_active_patients: None,
        ai_enabled: true,
    };

    /// Fails when one more active patient would exceed the plan.
    pub fn check_new_active_patient(&self, active_now: u32) -> Result<(), BillingError> {
        match self.max_active_patients {
            Some(max) if active_now >= max => Err(BillingError::PlanLimit(format!(
                "the free plan allows {max} active patients"
            ))),
            _ => Ok(()),
        }
    }

    pub fn require_ai(&self) -> Result<(), BillingError> {
        if self.ai_enabled {
            Ok(())
        } else {
            Err(BillingError::FeatureUnavailable("AI features"))
        }
    }
}

/// Pro access holds while trialing or active. A past-due subscription
/// keeps access until the end of the period already paid for.
pub fn entitlements(subscription: &Subscription, now: jiff::Timestamp) -> Entitlements {
    if subscription.plan != Plan::Pro {
        return Entitlements::FREE;
    }
    let paid_up = match subscription.status {
        SubscriptionStatus::Trialing | SubscriptionStatus::Active => true,
        SubscriptionStatus::PastDue => subscription
            .current_period_end
            .is_some_and(|end| now < end),
        SubscriptionStatus::Canceled | SubscriptionStatus::Incomplete => false,
    };
    if paid_up {
        Entitlements::PRO
    } else {
        Entitlements::FREE
    }
}
