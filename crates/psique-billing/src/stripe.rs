//! Minimal Stripe REST client: hosted checkout and the customer portal.

use serde::Deserialize;
use tracing::info;

use crate::error::BillingError;

const API_BASE: &str = "https://api.stripe.com/v1";

#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

/// Parameters for a subscription checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub professional_id: &'a str,
    pub price_id: &'a str,
    /// Reuse the existing customer after a cancellation.
    pub customer_id: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, secret_key: impl Into<String>) -> Self {
        Self {
            http,
            secret_key: secret_key.into(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Point the client at another host, e.g. stripe-mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        let session: CheckoutSession = self
            .post("/checkout/sessions", &checkout_form(request))
            .await?;
        info!(
            professional_id = request.professional_id,
            checkout_session = %session.id,
            "created checkout session"
        );
        Ok(session)
    }

    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, BillingError> {
        let form = vec![
            ("customer", customer_id.to_string()),
            ("return_url", return_url.to_string()),
        ];
        self.post("/billing_portal/sessions", &form).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T, BillingError> {
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            return Err(BillingError::Stripe {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp.json().await?)
    }
}

/// Form fields for `POST /v1/checkout/sessions`. The professional id rides
/// along as `client_reference_id` and subscription metadata so webhooks can
/// be tied back to the tenant.
pub fn checkout_form(request: &CheckoutRequest<'_>) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", request.price_id.to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("success_url", request.success_url.to_string()),
        ("cancel_url", request.cancel_url.to_string()),
        ("client_reference_id", request.professional_id.to_string()),
        (
            "subscription_data[metadata][professional_id]",
            request.professional_id.to_string(),
        ),
        ("allow_promotion_codes", "true".to_string()),
    ];
    match (request.customer_id, request.customer_email) {
        (Some(customer), _) => form.push(("customer", customer.to_string())),
        (None, Some(email)) => form.push(("customer_email", email.to_string())),
        (None, None) => {}
    }
    form
}
