use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

pub type AuthResult<T> = Result<T, AuthError>;

/// Reasons a presented credential can be rejected.
///
/// Every variant except `Store` maps to a uniform 401 body; the specific
/// sub-reason is for logs only so callers cannot probe token state.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
    #[error("token could not be parsed")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("no identity found for subject '{0}'")]
    UnknownIdentity(Uuid),
    #[error("identity '{0}' is deactivated")]
    Inactive(Uuid),
    #[error("credential store lookup failed: {0}")]
    Store(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Store(detail) => {
                error!(detail = %detail, "credential store failure while authenticating");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        code: "internal_error",
                        message: "Internal server error",
                    }),
                )
                    .into_response()
            }
            AuthError::Signing(detail) => {
                error!(detail = %detail, "token signing failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        code: "internal_error",
                        message: "Internal server error",
                    }),
                )
                    .into_response()
            }
            reason => {
                warn!(reason = %reason, "rejected request credential");
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorBody {
                        code: "unauthorized",
                        message: "Not authorized",
                    }),
                )
                    .into_response()
            }
        }
    }
}
