use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use psique_auth::jwt::{bearer_token, validate_token};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT validation middleware.
///
/// Validates the `Authorization: Bearer <token>` header against the user
/// pool's JWKS and inserts [`AuthUser`] into request extensions. The Cognito
/// `sub` is the tenant id for every handler downstream.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let token = bearer_token(header)?;

    let claims = validate_token(
        token,
        &state.keys,
        &state.config.user_pool_id,
        &state.config.region,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected token");
        ApiError::from(e)
    })?;

    let user = AuthUser {
        sub: claims.sub,
        email: claims.email,
    };
    req.extensions_mut().insert(user.clone());

    let mut response = next.run(req).await;
    // Exposed to the request log, which runs outside this layer.
    response.extensions_mut().insert(user);
    Ok(response)
}

/// Authenticated user extracted from JWT claims.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub sub: String,
    pub email: Option<String>,
}
