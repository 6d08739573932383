mod context;
pub use context::{AuthenticatedUser, RequestContext, UserRole};

mod error;
pub use error::{ErrorResponse, FieldError, WebError, WebResult};

pub mod dto;
pub mod middlewares;

mod state;
pub use state::AppState;

pub mod routes;
pub mod validate;

pub mod doc;
