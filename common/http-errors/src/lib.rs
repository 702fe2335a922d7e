use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON body shape shared by every error response.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    pub error: String,
}

/// Request-level failures surfaced to API clients. Startup failures are not
/// represented here; those abort the process before the router exists.
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: String },
    NotFound { code: &'static str, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest { code, message: message.into() }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal { message: e.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message),
            ApiError::Internal { message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        let body = ErrorBody { code: code.into(), error: message };
        let mut resp = (status, Json(body)).into_response();
        // X-Error-Code feeds the error-metrics middleware in the service.
        if let Ok(val) = HeaderValue::from_str(code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}
