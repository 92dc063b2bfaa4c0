use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use tracing::info;

use crate::error::AuthError;

/// Issuer URL of a Cognito user pool.
pub fn issuer(region: &str, user_pool_id: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/{user_pool_id}")
}

pub fn jwks_url(region: &str, user_pool_id: &str) -> String {
    format!("{}/.well-known/jwks.json", issuer(region, user_pool_id))
}

/// Public signing keys of a user pool.
#[derive(Debug, Clone)]
pub struct KeySet {
    keys: JwkSet,
}

impl KeySet {
    pub fn new(keys: JwkSet) -> Self {
        Self { keys }
    }

    pub fn from_json(json: &str) -> Result<Self, AuthError> {
        let keys: JwkSet =
            serde_json::from_str(json).map_err(|e| AuthError::Jwks(e.to_string()))?;
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }

    pub fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwk = self
            .keys
            .find(kid)
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))?;
        Ok(DecodingKey::from_jwk(jwk)?)
    }
}

/// Download the JWKS of a user pool. Called once at cold start.
pub async fn fetch_jwks(
    http: &reqwest::Client,
    region: &str,
    user_pool_id: &str,
) -> Result<KeySet, AuthError> {
    let url = jwks_url(region, user_pool_id);
    let keys: JwkSet = http
        .get(&url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AuthError::Jwks(e.to_string()))?
        .json()
        .await
        .map_err(|e| AuthError::Jwks(e.to_string()))?;

    info!(url, keys = keys.keys.len(), "fetched JWKS");
    Ok(KeySet::new(keys))
}
