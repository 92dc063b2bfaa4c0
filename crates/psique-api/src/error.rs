use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use psique_ai::error::AiError;
use psique_auth::error::AuthError;
use psique_billing::error::BillingError;
use psique_core::error::CoreError;
use psique_export::error::ExportError;
use psique_schedule::error::ScheduleError;
use psique_storage::error::StorageError;
use psique_transcribe::error::TranscribeError;

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    PaymentRequired(String),
    Conflict(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::PaymentRequired(msg)
            | ApiError::Conflict(msg) => msg,
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                "internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound { key } => ApiError::NotFound(format!("object not found: {key}")),
            StorageError::PreconditionFailed { .. } => {
                ApiError::Conflict("record was modified concurrently, reload and retry".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        match e {
            ScheduleError::InvalidTransition { .. }
            | ScheduleError::InvalidPaymentTransition { .. }
            | ScheduleError::PaymentOnCancelledSession
            | ScheduleError::NotReschedulable(_) => ApiError::Conflict(e.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::EmptyInput(_) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TranscribeError> for ApiError {
    fn from(e: TranscribeError) -> Self {
        match e {
            TranscribeError::UnsupportedFormat(_) => ApiError::BadRequest(e.to_string()),
            TranscribeError::Storage(inner) => inner.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::PlanLimit(_) | BillingError::FeatureUnavailable(_) => {
                ApiError::PaymentRequired(e.to_string())
            }
            BillingError::InvalidSignature(_) | BillingError::MalformedEvent(_) => {
                ApiError::BadRequest(e.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<jiff::Error> for ApiError {
    fn from(e: jiff::Error) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psique_core::models::session::SessionStatus;

    #[test]
    fn storage_errors_map_to_http_statuses() {
        let missing: ApiError = StorageError::NotFound { key: "k".into() }.into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let stale: ApiError = StorageError::PreconditionFailed { key: "k".into() }.into();
        assert_eq!(stale.status(), StatusCode::CONFLICT);

        let s3: ApiError = StorageError::PutObject("throttled".into()).into();
        assert_eq!(s3.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn lifecycle_violations_are_conflicts() {
        let err: ApiError = ScheduleError::InvalidTransition {
            from: SessionStatus::Completed,
            to: SessionStatus::Cancelled,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = ScheduleError::InvalidDuration { max: 480 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn plan_limits_require_payment() {
        let err: ApiError = BillingError::FeatureUnavailable("AI features").into();
        assert_eq!(err.status(), StatusCode::PAYMENT_REQUIRED);

        let err: ApiError = BillingError::InvalidSignature("no matching signature").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn transcription_storage_errors_keep_their_status() {
        let err: ApiError = TranscribeError::Storage(StorageError::NotFound {
            key: "audio".into(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        let err: ApiError = AuthError::TokenExpired.into();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
