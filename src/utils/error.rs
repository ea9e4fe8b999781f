use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use validator::ValidationErrors;

use crate::models::common::ApiResponse;

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<ValidationErrors> for UsageError {
    fn from(err: ValidationErrors) -> Self {
        UsageError::Validation(err.to_string())
    }
}

impl ResponseError for UsageError {
    fn status_code(&self) -> StatusCode {
        match self {
            UsageError::Validation(_) => StatusCode::BAD_REQUEST,
            UsageError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UsageError::NotFound(_) => StatusCode::NOT_FOUND,
            UsageError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let UsageError::Persistence(msg) = self {
            log::error!("Usage store failure: {}", msg);
        }
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::error(self.to_string()))
    }
}
