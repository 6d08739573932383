use thiserror::Error;

pub type PaymentResult<T> = std::result::Result<T, PaymentError>;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("gateway is not configured")]
    NotConfigured,
}
