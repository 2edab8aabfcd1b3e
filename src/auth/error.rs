//! Authorization failures and their HTTP rendering.
//!
//! Every stage of the bearer-token chain returns one of these kinds. All of
//! them are terminal for the current request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors raised while decoding a credential or checking its permissions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is expected")]
    MissingHeader,

    #[error("Authorization header must be of the form 'Bearer <token>'")]
    MalformedHeader,

    #[error("Authorization token is malformed: {0}")]
    MalformedToken(String),

    #[error("Unable to find a key matching the token key id")]
    UnknownKeyId,

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Incorrect claims: {0}")]
    InvalidClaims(String),

    #[error("Permissions not found in claims")]
    MissingPermissions,

    #[error("Permission not found: {0}")]
    PermissionDenied(String),

    #[error("Key set unavailable: {0}")]
    KeySetUnavailable(String),
}

impl AuthError {
    /// Machine-readable code surfaced to callers
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader => "invalid_header",
            AuthError::MalformedToken(_) => "malformed_token",
            AuthError::UnknownKeyId => "invalid_key_id",
            AuthError::SignatureInvalid => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::MissingPermissions => "missing_permissions",
            AuthError::PermissionDenied(_) => "permission_denied",
            AuthError::KeySetUnavailable(_) => "jwks_unavailable",
        }
    }

    /// HTTP status for this failure
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthError::KeySetUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": status.as_u16(),
                "code": self.code(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}
