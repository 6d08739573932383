use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};

use crate::{
    auth::{self, UserClaims, hash_password, verify_password},
    model::{
        CrudRepository, ResourceTyped,
        entity::{User, UserCreate, UserUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            auth::{AuthPayload, LoginBody, RegisterBody},
        },
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
        validate::Validator,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/profile", get(profile_get_handler).put(profile_update_handler))
        .route("/refresh-token", post(refresh_token_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .merge(protected)
        .with_state(state)
}

/// Signs a token for `user` and stores it in the `SID` cookie.
fn issue_session(state: &AppState, cookies: &Cookies, user: &User) -> WebResult<AuthPayload> {
    let app = state.config().app();
    let role = user.role();
    let claims = UserClaims::new(user.id(), user.email(), role.as_str(), app.jwt_expire_hours());
    let token = auth::generate_token(claims, app.jwt())
        .map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token.clone());
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);

    Ok(AuthPayload {
        user_id: user.id(),
        email: user.email().to_string(),
        full_name: user.full_name().to_string(),
        role: role.to_string(),
        token,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterBody,
    description = "Creates a student or instructor account and signs it in",
    responses(
        (status = 201, description = "User registered", body = AuthPayload),
        (status = 400, description = "Invalid input or role", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth"
)]
async fn register_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<RegisterBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate().map_err(WebError::validation)?;
    let role = payload.requested_role().ok_or_else(|| {
        WebError::resource_bad_request(
            User::get_resource_type(),
            "Role must be either student or instructor.",
        )
    })?;

    let admin = AuthenticatedUser::admin();
    let email = payload.email.trim().to_lowercase();
    let found = User::find_by_email(state.pool(), &admin, &email)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let data = UserCreate {
        email,
        password_hash: hash,
        full_name: payload.full_name.trim().to_string(),
        role,
        phone: payload.phone.filter(|p| !p.is_empty()),
    };

    let created = User::create(state.pool(), &admin, data).await.map_err(|e| {
        if e.is_unique_violation() {
            WebError::registration_conflict()
        } else {
            WebError::resource_fetch_error(User::get_resource_type(), e)
        }
    })?;

    tracing::info!("registered user {} as {}", created.id(), role);
    let payload = issue_session(&state, &cookies, &created)?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("User registered successfully", payload),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginBody,
    description = "Authorizes user in the system",
    responses(
        (status = 200, description = "User signed in", body = AuthPayload),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 403, description = "Account disabled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "auth",
)]
async fn login_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate().map_err(WebError::validation)?;

    let admin = AuthenticatedUser::admin();
    let email = payload.email.trim().to_lowercase();
    let Some(mut found) = User::find_by_email(state.pool(), &admin, &email)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?
    else {
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified =
        verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    if !found.is_active() {
        return Err(WebError::auth_account_disabled());
    }

    found
        .touch_last_login(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    let payload = issue_session(&state, &cookies, &found)?;
    Ok(ApiResponse::with_message("Login successful", payload))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    description = "Clears the session cookie",
    responses(
        (status = 200, description = "Signed out"),
    ),
    tag = "auth",
)]
async fn logout_handler(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::new(AUTH_TOKEN, "");
    cookie.set_path("/");
    cookies.remove(cookie);
    ApiResponse::message("Logged out")
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "User no longer exists", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []), ("bearer" = []))
)]
async fn profile_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = User::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    Ok(ApiResponse::ok(found))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UserUpdate,
    description = "Updates name, phone or avatar; absent fields are kept",
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []), ("bearer" = []))
)]
async fn profile_update_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(mut payload): Json<UserUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    let mut validator = Validator::new();
    if let Some(name) = payload.full_name.as_deref() {
        validator.full_name("full_name", name);
    }
    validator
        .phone("phone", payload.phone.as_deref())
        .finish()
        .map_err(WebError::validation)?;
    payload.full_name = payload.full_name.map(|n| n.trim().to_string());

    let found = User::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    let updated = found
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Profile updated successfully", updated))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    responses(
        (status = 200, description = "Fresh token", body = AuthPayload),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "auth",
    security(("cookie" = []), ("bearer" = []))
)]
async fn refresh_token_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    cookies: Cookies,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let found = User::find_by_id(state.pool(), user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?
        .ok_or_else(WebError::auth_token_invalid)?;

    let payload = issue_session(&state, &cookies, &found)?;
    Ok(ApiResponse::ok(payload))
}
