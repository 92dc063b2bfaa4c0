use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("plan limit reached: {0}")]
    PlanLimit(String),

    #[error("feature requires the pro plan: {0}")]
    FeatureUnavailable(&'static str),

    #[error("invalid webhook signature: {0}")]
    InvalidSignature(&'static str),

    #[error("malformed webhook event: {0}")]
    MalformedEvent(String),

    #[error("Stripe API error ({status}): {message}")]
    Stripe { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
