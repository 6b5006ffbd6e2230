use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// The four failures an endpoint can answer with.
///
/// Each renders as `{"success": false, "error": <status>, "message": <text>}`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest,

    #[error("resource not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("unprocessable")]
    Unprocessable,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

// store failures inside a handler are unprocessable unless the handler says otherwise
impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        warn!(error = %e, "request failed");
        Self::Unprocessable
    }
}

// bodies that aren't json at all are bad requests, json of the wrong shape is unprocessable
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "rejected request body");
        match rejection {
            JsonRejection::JsonDataError(_) => Self::Unprocessable,
            _ => Self::BadRequest,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "success": false,
            "error": status.as_u16(),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
