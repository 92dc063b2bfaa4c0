use std::sync::Arc;

use psique_auth::jwks::KeySet;
use psique_billing::stripe::StripeClient;
use psique_storage::bucket::Bucket;

use crate::config::ApiConfig;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub bucket: Bucket,
    pub bedrock: aws_sdk_bedrockruntime::Client,
    /// Transcribe clients are built per job from this.
    pub aws: Arc<aws_config::SdkConfig>,
    pub keys: Arc<KeySet>,
    pub stripe: StripeClient,
    pub config: Arc<ApiConfig>,
}
