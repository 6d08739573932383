mod auth;
pub use auth::{ACCESS_TOKEN_HEADER, AUTH_TOKEN, extract_context_fn};
