use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use jiff::Timestamp;
use serde::Serialize;
use tracing::{info, warn};

use psique_audit::{AuditAction, AuditEvent, ResourceType};
use psique_billing::plans::{Entitlements, entitlements};
use psique_billing::stripe::CheckoutRequest;
use psique_billing::webhook::{
    BillingEvent, DEFAULT_TOLERANCE_SECS, apply_event, parse_event, verify_signature,
};
use psique_core::keys;
use psique_core::models::subscription::{CustomerLink, Subscription};
use psique_storage::records;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::tenant;
use crate::state::AppState;

/// Audit actor for changes made by the payment provider.
const WEBHOOK_ACTOR: &str = "stripe-webhook";

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub subscription: Subscription,
    pub entitlements: Entitlements,
}

#[derive(Debug, Serialize)]
pub struct RedirectUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

pub async fn get_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SubscriptionView>, ApiError> {
    let subscription = tenant::subscription(&state, &user.sub).await?;
    let entitlements = entitlements(&subscription, Timestamp::now());
    Ok(Json(SubscriptionView {
        subscription,
        entitlements,
    }))
}

/// Start a hosted checkout for the pro plan.
pub async fn checkout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RedirectUrl>, ApiError> {
    let profile = tenant::profile(&state, &user).await?;
    let subscription = tenant::subscription(&state, &user.sub).await?;
    if entitlements(&subscription, Timestamp::now()).ai_enabled {
        return Err(ApiError::Conflict(
            "already subscribed, use the billing portal".to_string(),
        ));
    }

    let app_url = &state.config.app_url;
    let success_url = format!("{app_url}/assinatura?status=sucesso");
    let cancel_url = format!("{app_url}/assinatura");
    let email = Some(profile.email.as_str()).filter(|e| !e.is_empty());
    let session = state
        .stripe
        .create_checkout_session(&CheckoutRequest {
            professional_id: &user.sub,
            price_id: &state.config.stripe_pro_price_id,
            customer_id: subscription.customer_id.as_deref(),
            customer_email: email,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    let url = session
        .url
        .ok_or_else(|| ApiError::Internal("checkout session has no URL".to_string()))?;
    Ok(Json(RedirectUrl { url }))
}

/// Customer portal for managing payment method and cancelling.
pub async fn portal(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RedirectUrl>, ApiError> {
    let subscription = tenant::subscription(&state, &user.sub).await?;
    let customer_id = subscription
        .customer_id
        .ok_or_else(|| ApiError::BadRequest("no billing account yet".to_string()))?;
    let return_url = format!("{}/assinatura", state.config.app_url);
    let session = state
        .stripe
        .create_portal_session(&customer_id, &return_url)
        .await?;
    Ok(Json(RedirectUrl { url: session.url }))
}

/// Stripe webhook endpoint. Unauthenticated; trust comes from the signature.
///
/// Events that cannot be tied to a tenant are acknowledged and logged so
/// Stripe stops retrying them.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing Stripe-Signature header".to_string()))?;
    verify_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        Timestamp::now().as_second(),
        DEFAULT_TOLERANCE_SECS,
    )?;

    let Some(event) = parse_event(&body)? else {
        return Ok(Json(WebhookAck { received: true }));
    };

    let Some(professional_id) = resolve_tenant(&state, &event).await? else {
        warn!(customer_id = event.customer_id(), "billing event for unknown customer");
        return Ok(Json(WebhookAck { received: true }));
    };

    let key = keys::subscription(&professional_id);
    let current = tenant::subscription(&state, &professional_id).await?;
    let updated = apply_event(current, event.clone(), Timestamp::now());
    records::save(&state.bucket, &key, &updated).await?;

    if event.professional_id().is_some() {
        let link = CustomerLink {
            customer_id: event.customer_id().to_string(),
            professional_id: professional_id.clone(),
        };
        records::save(&state.bucket, &keys::billing_customer(&link.customer_id), &link).await?;
    }

    info!(
        professional_id = %professional_id,
        plan = ?updated.plan,
        status = ?updated.status,
        "subscription updated"
    );
    AuditEvent::new(AuditAction::Update, ResourceType::Subscription, &professional_id, WEBHOOK_ACTOR)
        .with_details(serde_json::json!({ "plan": updated.plan, "status": updated.status }))
        .emit();

    Ok(Json(WebhookAck { received: true }))
}

/// The tenant an event belongs to: named in the event, or found through the
/// customer link written at checkout.
async fn resolve_tenant(state: &AppState, event: &BillingEvent) -> Result<Option<String>, ApiError> {
    if let Some(id) = event.professional_id() {
        return Ok(Some(id.to_string()));
    }
    let link: Option<CustomerLink> =
        records::load_optional(&state.bucket, &keys::billing_customer(event.customer_id())).await?;
    Ok(link.map(|l| l.professional_id))
}
