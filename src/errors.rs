use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Payment not completed")]
    PaymentNotCompleted,

    #[error("Product not found: {0}")]
    ProductResolution(String),

    #[error("Payment provider error: {0}")]
    PaymentProvider(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::PaymentNotCompleted => "PAYMENT_NOT_COMPLETED",
            AppError::ProductResolution(_) => "PRODUCT_RESOLUTION",
            AppError::PaymentProvider(_) => "PAYMENT_PROVIDER",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::InvalidInput(msg) => AppError::InvalidInput(msg),
            DomainError::PaymentNotCompleted { .. } => AppError::PaymentNotCompleted,
            DomainError::ProductResolution { product_name } => {
                AppError::ProductResolution(product_name)
            }
            DomainError::PaymentProvider(msg) => AppError::PaymentProvider(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl actix_web::ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::PaymentNotCompleted => StatusCode::BAD_REQUEST,
            AppError::ProductResolution(_)
            | AppError::PaymentProvider(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::PaymentProvider(msg) | AppError::Internal(msg) => {
                log::error!("{} error: {}", self.code(), msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": message,
            "code": self.code(),
        }))
    }
}
