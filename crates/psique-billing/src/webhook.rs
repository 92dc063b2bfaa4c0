//! Stripe webhook verification and subscription state updates.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, info};

use psique_core::models::subscription::{Plan, Subscription, SubscriptionStatus};

use crate::error::BillingError;

/// Maximum age of a signed webhook, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Check a `Stripe-Signature` header (`t=...,v1=...[,v1=...]`).
///
/// The signed message is `"{t}.{payload}"` with HMAC-SHA256 keyed by the
/// endpoint secret. Any matching `v1` is accepted so secrets can be rolled.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), BillingError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => {
                if let Some(bytes) = decode_hex(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(BillingError::InvalidSignature("missing timestamp"))?;
    if signatures.is_empty() {
        return Err(BillingError::InvalidSignature("missing v1 signature"));
    }
    let age = now.checked_sub(timestamp).map(i64::unsigned_abs);
    if age.is_none_or(|age| age > tolerance_secs.unsigned_abs()) {
        return Err(BillingError::InvalidSignature("timestamp outside tolerance"));
    }

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| BillingError::InvalidSignature("unusable secret"))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice compares in constant time.
    if signatures
        .iter()
        .any(|sig| mac.clone().verify_slice(sig).is_ok())
    {
        Ok(())
    } else {
        Err(BillingError::InvalidSignature("no matching signature"))
    }
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

/// The webhook events that change a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    CheckoutCompleted {
        customer_id: String,
        subscription_id: Option<String>,
        /// `client_reference_id` set when the checkout was created.
        professional_id: Option<String>,
    },
    SubscriptionChanged {
        customer_id: String,
        subscription_id: String,
        status: SubscriptionStatus,
        current_period_end: Option<jiff::Timestamp>,
        professional_id: Option<String>,
    },
    SubscriptionDeleted {
        customer_id: String,
        subscription_id: String,
    },
    PaymentFailed {
        customer_id: String,
    },
}

impl BillingEvent {
    pub fn customer_id(&self) -> &str {
        match self {
            BillingEvent::CheckoutCompleted { customer_id, .. }
            | BillingEvent::SubscriptionChanged { customer_id, .. }
            | BillingEvent::SubscriptionDeleted { customer_id, .. }
            | BillingEvent::PaymentFailed { customer_id } => customer_id,
        }
    }

    /// Tenant named in the event itself, when Stripe carries it.
    pub fn professional_id(&self) -> Option<&str> {
        match self {
            BillingEvent::CheckoutCompleted {
                professional_id, ..
            }
            | BillingEvent::SubscriptionChanged {
                professional_id, ..
            } => professional_id.as_deref(),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct CheckoutObject {
    customer: Option<String>,
    subscription: Option<String>,
    client_reference_id: Option<String>,
}

#[derive(Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: String,
    status: String,
    current_period_end: Option<i64>,
    #[serde(default)]
    items: Option<ItemList>,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
}

#[derive(Deserialize)]
struct ItemList {
    data: Vec<SubscriptionItem>,
}

#[derive(Deserialize)]
struct SubscriptionItem {
    current_period_end: Option<i64>,
}

#[derive(Deserialize)]
struct InvoiceObject {
    customer: String,
}

/// Parse a verified payload. Event types we do not act on are `Ok(None)`.
pub fn parse_event(payload: &[u8]) -> Result<Option<BillingEvent>, BillingError> {
    let envelope: Envelope =
        serde_json::from_slice(payload).map_err(|e| BillingError::MalformedEvent(e.to_string()))?;
    let object = envelope.data.object;

    let event = match envelope.kind.as_str() {
        "checkout.session.completed" => {
            let checkout: CheckoutObject = from_object(object)?;
            let customer_id = checkout
                .customer
                .ok_or_else(|| BillingError::MalformedEvent("checkout without customer".into()))?;
            BillingEvent::CheckoutCompleted {
                customer_id,
                subscription_id: checkout.subscription,
                professional_id: checkout.client_reference_id,
            }
        }
        "customer.subscription.created" | "customer.subscription.updated" => {
            let sub: SubscriptionObject = from_object(object)?;
            // Newer API versions moved the period end onto the items.
            let period_end = sub.current_period_end.or_else(|| {
                sub.items
                    .as_ref()
                    .and_then(|items| items.data.iter().filter_map(|i| i.current_period_end).max())
            });
            BillingEvent::SubscriptionChanged {
                status: map_status(&sub.status),
                current_period_end: period_end.and_then(|s| jiff::Timestamp::from_second(s).ok()),
                professional_id: sub.metadata.get("professional_id").cloned(),
                customer_id: sub.customer,
                subscription_id: sub.id,
            }
        }
        "customer.subscription.deleted" => {
            let sub: SubscriptionObject = from_object(object)?;
            BillingEvent::SubscriptionDeleted {
                customer_id: sub.customer,
                subscription_id: sub.id,
            }
        }
        "invoice.payment_failed" => {
            let invoice: InvoiceObject = from_object(object)?;
            BillingEvent::PaymentFailed {
                customer_id: invoice.customer,
            }
        }
        other => {
            debug!(event_id = %envelope.id, kind = other, "ignoring webhook event");
            return Ok(None);
        }
    };
    info!(event_id = %envelope.id, kind = %envelope.kind, "billing event");
    Ok(Some(event))
}

fn from_object<T: serde::de::DeserializeOwned>(object: serde_json::Value) -> Result<T, BillingError> {
    serde_json::from_value(object).map_err(|e| BillingError::MalformedEvent(e.to_string()))
}

fn map_status(status: &str) -> SubscriptionStatus {
    match status {
        "trialing" => SubscriptionStatus::Trialing,
        "active" => SubscriptionStatus::Active,
        "past_due" | "unpaid" => SubscriptionStatus::PastDue,
        "incomplete" => SubscriptionStatus::Incomplete,
        _ => SubscriptionStatus::Canceled,
    }
}

/// The subscription after `event`.
pub fn apply_event(mut subscription: Subscription, event: BillingEvent, now: jiff::Timestamp) -> Subscription {
    match event {
        BillingEvent::CheckoutCompleted {
            customer_id,
            subscription_id,
            ..
        } => {
            subscription.customer_id = Some(customer_id);
            if subscription_id.is_some() {
                subscription.subscription_id = subscription_id;
            }
            // The subscription event may arrive first and already say trialing.
            if subscription.plan != Plan::Pro
                || !matches!(
                    subscription.status,
                    SubscriptionStatus::Trialing | SubscriptionStatus::Active
                )
            {
                subscription.status = SubscriptionStatus::Active;
            }
            subscription.plan = Plan::Pro;
        }
        BillingEvent::SubscriptionChanged {
            customer_id,
            subscription_id,
            status,
            current_period_end,
            ..
        } => {
            subscription.customer_id = Some(customer_id);
            subscription.subscription_id = Some(subscription_id);
            subscription.status = status;
            subscription.plan = if status == SubscriptionStatus::Canceled {
                Plan::Free
            } else {
                Plan::Pro
            };
            if current_period_end.is_some() {
                subscription.current_period_end = current_period_end;
            }
        }
        BillingEvent::SubscriptionDeleted {
            customer_id,
            subscription_id,
        } => {
            // A stale delete for an already replaced subscription changes nothing.
            if subscription
                .subscription_id
                .as_deref()
                .is_some_and(|current| current != subscription_id)
            {
                return subscription;
            }
            subscription.customer_id = Some(customer_id);
            subscription.subscription_id = None;
            subscription.plan = Plan::Free;
            subscription.status = SubscriptionStatus::Canceled;
            subscription.current_period_end = None;
        }
        BillingEvent::PaymentFailed { .. } => {
            if subscription.plan == Plan::Pro {
                subscription.status = SubscriptionStatus::PastDue;
            }
        }
    }
    subscription.updated_at = now;
    subscription
}
