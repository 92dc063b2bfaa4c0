use jsonwebtoken::{Algorithm, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::jwks::{KeySet, issuer};

/// Claims extracted from a Cognito JWT.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CognitoClaims {
    pub sub: String,
    pub iss: String,
    pub token_use: String,
    pub exp: u64,
    pub iat: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Validate a Cognito access or id token against the pool's keys.
pub fn validate_token(
    token: &str,
    keys: &KeySet,
    user_pool_id: &str,
    region: &str,
) -> Result<CognitoClaims, AuthError> {
    let header = decode_header(token)?;
    if header.alg != Algorithm::RS256 {
        return Err(AuthError::InvalidToken(format!(
            "unexpected algorithm: {:?}",
            header.alg
        )));
    }
    let kid = header
        .kid
        .ok_or_else(|| AuthError::InvalidToken("missing kid".to_string()))?;
    let key = keys.decoding_key(&kid)?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[issuer(region, user_pool_id)]);
    validation.validate_exp = true;
    // Access tokens carry client_id instead of aud.
    validation.validate_aud = false;

    let token_data = decode::<CognitoClaims>(token, &key, &validation)?;

    let token_use = &token_data.claims.token_use;
    if token_use != "access" && token_use != "id" {
        return Err(AuthError::InvalidToken(format!(
            "unexpected token_use: {token_use}"
        )));
    }

    Ok(token_data.claims)
}

/// Strip the `Bearer ` prefix from an Authorization header value.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}
