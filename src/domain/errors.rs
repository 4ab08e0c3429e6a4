use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Payment not completed (status: {status})")]
    PaymentNotCompleted { status: String },
    #[error("Product not found: {product_name}")]
    ProductResolution { product_name: String },
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
