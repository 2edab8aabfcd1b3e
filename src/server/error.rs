//! JSON error responses for the drinks API

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::auth::AuthError;
use crate::drinks::StoreError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request")]
    BadRequest(String),

    #[error("Sorry, we couldn't find what you were looking for")]
    NotFound,

    #[error("unprocessable")]
    Unprocessable(String),

    #[error("It's not you, it's us")]
    Internal(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(e) => e.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Auth(e) => return e.into_response(),
            ApiError::Internal(ref detail) => error!("Internal error: {}", detail),
            ApiError::BadRequest(ref detail) | ApiError::Unprocessable(ref detail) => {
                debug!("Rejected request ({}): {}", status, detail)
            }
            ApiError::NotFound => {}
        }

        (
            status,
            Json(serde_json::json!({
                "success": false,
                "error": status.as_u16(),
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::DuplicateTitle(_) | StoreError::Invalid(_) => {
                ApiError::Unprocessable(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::Unprocessable(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::NotFound
    }
}
