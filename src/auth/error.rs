use thiserror::Error;

pub type CryptResult<T> = std::result::Result<T, CryptError>;

#[derive(Debug, Error)]
pub enum CryptError {
    #[error("password hashing failed: {0}")]
    Argon2Error(#[from] argon2::password_hash::Error),
    #[error("session token error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    #[error("token subject `{0}` is not a user id")]
    InvalidSubject(String),
}
