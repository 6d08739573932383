use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        analytics::CourseAnalytics,
        entity::{Course, XapiStatement, XapiStatementCreate},
    },
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            xapi::{DEFAULT_HISTORY_LIMIT, HistoryQuery, StatementBody},
        },
        error::ErrorResponse,
        middlewares,
        routes::MAX_PAGE_LIMIT,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/track", post(track_handler))
        .route("/statement", post(track_handler))
        .route("/history", get(history_handler))
        .route("/analytics/{course_id}", get(analytics_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/xapi/track",
    request_body = StatementBody,
    description = "Records a learning event; also mounted at `/api/xapi/statement`",
    responses(
        (status = 201, description = "Statement stored", body = XapiStatement),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "xapi"
)]
async fn track_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<StatementBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    payload.validate().map_err(WebError::validation)?;

    let statement = XapiStatement::create(
        state.pool(),
        XapiStatementCreate {
            student_id: user.user_id(),
            verb: payload.verb,
            object_type: payload.object_type,
            object_id: payload.object_id,
            result: payload.result,
            context: payload.context,
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(XapiStatement::get_resource_type(), e))?;

    tracing::debug!("xapi {} by {}", statement.verb(), user.user_id());
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Statement recorded", statement),
    ))
}

#[utoipa::path(
    get,
    path = "/api/xapi/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Caller's statements, newest first", body = Vec<XapiStatement>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "xapi"
)]
async fn history_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<HistoryQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let statements = XapiStatement::history(state.pool(), user.user_id(), limit, offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(XapiStatement::get_resource_type(), e))?;

    Ok(ApiResponse::ok(statements))
}

#[utoipa::path(
    get,
    path = "/api/xapi/analytics/{course_id}",
    params(
        ("course_id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course learning analytics", body = CourseAnalytics),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "xapi"
)]
async fn analytics_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(course_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let mm = state.pool();

    let course = Course::find_by_id(mm, user, course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(mm, user, &course, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access_error(Course::get_resource_type(), e))?;

    let analytics = CourseAnalytics::fetch(mm, course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(ApiResponse::ok(analytics))
}
