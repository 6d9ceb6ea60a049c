use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::products::validation::FieldErrors;

pub const NOT_FOUND_MESSAGE: &str = "Product not found";

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed: {0}")]
    ValidationFailed(FieldErrors),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl ProductError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProductError::NotFound => StatusCode::NOT_FOUND,
            ProductError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ProductError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProductError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ProductError::NotFound => (status, Json(json!({ "error": NOT_FOUND_MESSAGE }))).into_response(),
            ProductError::BadRequest(message) => (status, Json(json!({ "error": message }))).into_response(),
            ProductError::ValidationFailed(errors) => (status, Json(errors)).into_response(),
            ProductError::Storage(e) => {
                error!(error = %e, "storage failure");
                (status, Json(json!({ "error": "Internal server error" }))).into_response()
            }
        }
    }
}

pub type Result<T, E = ProductError> = std::result::Result<T, E>;
