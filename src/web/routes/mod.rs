use crate::{
    Config,
    web::{AppState, doc::ApiDoc, dto::ApiResponse, middlewares::ACCESS_TOKEN_HEADER},
};
use axum::{
    Json, Router,
    http::{
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
        header::{
            AUTHORIZATION, CONTENT_TYPE, HOST, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY,
            X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod admin;
pub mod assessments;
pub mod auth;
pub mod courses;
pub mod discussions;
pub mod payments;
pub mod reviews;
pub mod xapi;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct PaginationQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Public origin of this API: `app.api_url` when configured, otherwise
/// derived from the request's forwarded proto and `Host` header.
pub fn public_base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(url) = config.app().api_url() {
        return url.trim_end_matches('/').to_string();
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match config.app().client_url().parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!("client_url is not a valid origin ({e}), CORS will reject browsers");
            AllowOrigin::list([])
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(ACCESS_TOKEN_HEADER),
        ])
}

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState) -> Router<S> {
    let config = state.config();

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .nest("/api/auth", auth::routes(state.clone()))
        .nest("/api/courses", courses::catalog_routes(state.clone()))
        .merge(courses::learner_routes(state.clone()))
        .nest("/api/admin", admin::routes(state.clone()))
        .nest("/api/assessments", assessments::routes(state.clone()))
        .nest("/api/discussions", discussions::routes(state.clone()))
        .nest("/api/reviews", reviews::routes(state.clone()))
        .nest("/api/payments", payments::routes(state.clone()))
        .nest("/api/xapi", xapi::routes(state.clone()))
        .nest_service("/uploads", ServeDir::new(config.app().upload_dir()))
        .fallback(fallback_handler)
        .layer(CookieManagerLayer::default())
        .layer(SetResponseHeaderLayer::if_not_present(
            STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

#[derive(serde::Serialize)]
struct Health {
    success: bool,
    message: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

async fn health_handler() -> impl IntoResponse {
    Json(Health {
        success: true,
        message: "Server is running",
        timestamp: chrono::Utc::now(),
    })
}

async fn fallback_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, ApiResponse::failure("Route not found"))
}
