use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod middleware;
mod routes;
mod state;

use config::ApiConfig;
use psique_billing::stripe::StripeClient;
use psique_storage::bucket::Bucket;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ApiConfig::from_env()?;

    let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.region.clone()))
        .load()
        .await;
    let bucket = Bucket::new(psique_storage::client::from_config(&aws), &config.bucket);
    let bedrock = psique_ai::client::from_config(&aws);

    let http = reqwest::Client::new();
    let keys = psique_auth::jwks::fetch_jwks(&http, &config.region, &config.user_pool_id).await?;
    let stripe = StripeClient::new(http, &config.stripe_secret_key);

    let cors = CorsLayer::new()
        .allow_origin(config.app_url.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    tracing::info!(
        bucket = %config.bucket,
        model = %config.model_id,
        signing_keys = keys.len(),
        "psique api starting"
    );

    let state = AppState {
        bucket,
        bedrock,
        aws: Arc::new(aws),
        keys: Arc::new(keys),
        stripe,
        config: Arc::new(config),
    };

    let protected = Router::new()
        // Profile
        .route(
            "/me",
            get(routes::me::get_me).put(routes::me::update_me),
        )
        .route(
            "/me/assistant-instructions",
            get(routes::me::get_assistant_instructions).put(routes::me::put_assistant_instructions),
        )
        // Patients
        .route(
            "/patients",
            get(routes::patients::list_patients).post(routes::patients::create_patient),
        )
        .route(
            "/patients/{id}",
            get(routes::patients::get_patient)
                .put(routes::patients::update_patient)
                .delete(routes::patients::delete_patient),
        )
        .route(
            "/patients/{id}/sessions",
            get(routes::patients::list_patient_sessions),
        )
        .route(
            "/patients/{id}/documents",
            get(routes::documents::list_documents).post(routes::documents::create_document),
        )
        .route(
            "/patients/{id}/documents/{doc_id}",
            get(routes::documents::get_document).delete(routes::documents::delete_document),
        )
        .route("/patients/{id}/export", get(routes::export::export_patient))
        .route(
            "/patients/{id}/assistant",
            get(routes::assistant::get_history)
                .post(routes::assistant::ask)
                .delete(routes::assistant::clear_history),
        )
        // Sessions
        .route("/sessions", post(routes::sessions::create_session))
        .route("/sessions/recurring", post(routes::sessions::create_recurring))
        .route(
            "/sessions/{id}",
            get(routes::sessions::get_session)
                .put(routes::sessions::update_session)
                .delete(routes::sessions::delete_session),
        )
        .route("/sessions/{id}/status", post(routes::sessions::update_status))
        .route("/sessions/{id}/payment", post(routes::sessions::update_payment))
        .route(
            "/sessions/{id}/evolution",
            get(routes::evolution::get_evolution).put(routes::evolution::put_evolution),
        )
        .route("/sessions/{id}/evolution/draft", post(routes::evolution::draft))
        .route("/sessions/{id}/audio", post(routes::transcription::upload_audio))
        .route(
            "/sessions/{id}/transcription",
            get(routes::transcription::get_transcription).post(routes::transcription::transcribe),
        )
        .route(
            "/sessions/{id}/smart-notes",
            get(routes::smart_notes::get_smart_notes).post(routes::smart_notes::generate),
        )
        // Calendar and finance
        .route("/calendar", get(routes::calendar::get_calendar))
        .route("/calendar/day", get(routes::calendar::get_day))
        .route("/financial/summary", get(routes::financial::get_summary))
        // Billing
        .route("/subscription", get(routes::billing::get_subscription))
        .route("/billing/checkout", post(routes::billing::checkout))
        .route("/billing/portal", post(routes::billing::portal))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let app = Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        // Signed by Stripe instead of a user token
        .route("/billing/webhook", post(routes::billing::webhook))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum_mw::from_fn(middleware::audit::request_log)),
        )
        .with_state(state);

    lambda_http::run(app).await.map_err(|e| eyre::eyre!(e))
}
