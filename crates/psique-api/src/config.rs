use std::time::Duration;

use eyre::{Context, eyre};

/// Runtime configuration, read from the Lambda environment.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bucket: String,
    pub region: String,
    pub user_pool_id: String,
    pub model_id: String,
    pub transcribe_language: String,
    pub transcribe_max_speakers: i32,
    pub transcribe_deadline: Duration,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_pro_price_id: String,
    /// Front-end origin, used for checkout/portal return URLs and CORS.
    pub app_url: String,
}

const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-sonnet-4-20250514-v1:0";

impl ApiConfig {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |name: &str| get(name).ok_or_else(|| eyre!("{name} must be set"));

        let transcribe_max_speakers = match get("PSIQUE_TRANSCRIBE_MAX_SPEAKERS") {
            Some(v) => v
                .parse::<i32>()
                .wrap_err("PSIQUE_TRANSCRIBE_MAX_SPEAKERS must be a number")?,
            None => 2,
        };
        if !(2..=10).contains(&transcribe_max_speakers) {
            return Err(eyre!("PSIQUE_TRANSCRIBE_MAX_SPEAKERS must be between 2 and 10"));
        }
        let transcribe_deadline = match get("PSIQUE_TRANSCRIBE_DEADLINE_SECS") {
            Some(v) => Duration::from_secs(
                v.parse::<u64>()
                    .wrap_err("PSIQUE_TRANSCRIBE_DEADLINE_SECS must be a number")?,
            ),
            None => Duration::from_secs(12 * 60),
        };

        Ok(Self {
            bucket: get("PSIQUE_BUCKET").unwrap_or_else(|| "psique".to_string()),
            region: get("AWS_REGION").unwrap_or_else(|| "sa-east-1".to_string()),
            user_pool_id: require("COGNITO_USER_POOL_ID")?,
            model_id: get("PSIQUE_MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            transcribe_language: get("PSIQUE_TRANSCRIBE_LANGUAGE")
                .unwrap_or_else(|| "pt-BR".to_string()),
            transcribe_max_speakers,
            transcribe_deadline,
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,
            stripe_pro_price_id: require("STRIPE_PRO_PRICE_ID")?,
            app_url: get("PSIQUE_APP_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("COGNITO_USER_POOL_ID", "sa-east-1_abc"),
        ("STRIPE_SECRET_KEY", "sk_test_1"),
        ("STRIPE_WEBHOOK_SECRET", "whsec_1"),
        ("STRIPE_PRO_PRICE_ID", "price_1"),
    ];

    #[test]
    fn defaults_fill_optional_values() {
        let config = ApiConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.bucket, "psique");
        assert_eq!(config.transcribe_language, "pt-BR");
        assert_eq!(config.transcribe_max_speakers, 2);
        assert_eq!(config.app_url, "http://localhost:5173");
        assert_eq!(config.user_pool_id, "sa-east-1_abc");
    }

    #[test]
    fn missing_secret_is_a_startup_error() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "STRIPE_WEBHOOK_SECRET")
            .collect();
        let err = ApiConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("STRIPE_WEBHOOK_SECRET"));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PSIQUE_BUCKET", "  "));
        vars.push(("PSIQUE_APP_URL", "https://app.psique.com.br/"));
        let config = ApiConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.bucket, "psique");
        assert_eq!(config.app_url, "https://app.psique.com.br");
    }

    #[test]
    fn speaker_count_is_validated() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PSIQUE_TRANSCRIBE_MAX_SPEAKERS", "one"));
        assert!(ApiConfig::from_lookup(lookup(&vars)).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("PSIQUE_TRANSCRIBE_MAX_SPEAKERS", "40"));
        assert!(ApiConfig::from_lookup(lookup(&vars)).is_err());
    }
}
