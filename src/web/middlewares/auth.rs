use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    auth,
    model::{CrudRepository, ResourceTyped, entity::User},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";
pub static ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Token from `Authorization: Bearer`, then `x-access-token`, then the cookie.
fn find_token(headers: &HeaderMap, cookies: &Cookies) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string());

    let header = || {
        headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    };

    let cookie = || cookies.get(AUTH_TOKEN).map(|c| c.value().to_string());

    bearer
        .or_else(header)
        .or_else(cookie)
        .filter(|t| !t.is_empty())
}

pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let token = match find_token(req.headers(), &cookies) {
        Some(token) => token,
        None => {
            req.extensions_mut().insert(RequestContext::new(None));
            return Ok(next.run(req).await);
        }
    };

    let claims = match auth::process_token(&token, state.config().app().jwt()) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!("rejected token: {}", e);
            req.extensions_mut().insert(RequestContext::rejected());
            return Ok(next.run(req).await);
        }
    };

    let id = match claims.user_id() {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!("rejected token: {}", e);
            req.extensions_mut().insert(RequestContext::rejected());
            return Ok(next.run(req).await);
        }
    };

    let found = User::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    match found {
        Some(user) if !user.is_active() => Err(WebError::auth_account_disabled()),
        Some(user) => {
            req.extensions_mut()
                .insert(RequestContext::new(Some(AuthenticatedUser::new(id, user.role()))));
            Ok(next.run(req).await)
        }
        // token for a deleted account
        None => {
            req.extensions_mut().insert(RequestContext::rejected());
            Ok(next.run(req).await)
        }
    }
}
