//! Mapping from gateway errors to HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response}
};
use errors::GatewayError;
use serde_json::{Map, Value, json};
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Malformed request body: {0}")]
    MalformedBody(String)
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(err) => match err {
                GatewayError::Validation { .. } => StatusCode::BAD_REQUEST,
                GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
                GatewayError::Cache(_) | GatewayError::Internal { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MalformedBody(_) => "validation_error",
            ApiError::Gateway(err) => err.kind()
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::MalformedBody(_) => "MALFORMED_BODY",
            ApiError::Gateway(err) => err.error_code()
        }
    }

    fn body(&self) -> Value {
        let mut error = Map::new();
        error.insert("kind".into(), json!(self.kind()));
        error.insert("code".into(), json!(self.error_code()));

        match self {
            ApiError::MalformedBody(_) => {
                error.insert("message".into(), json!(self.to_string()));
            }
            ApiError::Gateway(err) => {
                let message = match err {
                    GatewayError::Cache(_) | GatewayError::Internal { .. } => {
                        tracing::error!(error = %err, "Internal gateway error");
                        "An internal error occurred".to_string()
                    }
                    _ => err.to_string()
                };
                error.insert("message".into(), json!(message));

                match err {
                    GatewayError::Validation { violations } => {
                        error.insert("violations".into(), json!(violations));
                    }
                    GatewayError::RateLimited { retry_after, scope } => {
                        error.insert("retryAfter".into(), json!(retry_after));
                        error.insert("scope".into(), json!(scope.as_str()));
                    }
                    GatewayError::Timeout { attempts, .. }
                    | GatewayError::Upstream { attempts, .. } => {
                        error.insert("attempts".into(), json!(attempts));
                    }
                    _ => {}
                }
            }
        }

        json!({ "error": error })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, Json(self.body())).into_response();

        if let ApiError::Gateway(GatewayError::RateLimited { retry_after, .. }) = &self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after));
        }

        response
    }
}
