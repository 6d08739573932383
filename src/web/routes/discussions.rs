use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{
            Discussion, DiscussionCreate, DiscussionReply, DiscussionReplyCreate,
            DiscussionReplyRow, DiscussionRow, DiscussionUpdate, Module,
        },
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            discussions::{DiscussionQuery, ReplyBody},
        },
        error::ErrorResponse,
        middlewares,
        validate::Validator,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", post(discussions_create_handler))
        .route("/modules/{module_id}", get(discussions_list_handler))
        .route(
            "/{id}",
            get(discussions_get_handler)
                .put(discussions_update_handler)
                .delete(discussions_delete_handler),
        )
        .route(
            "/{id}/replies",
            get(replies_list_handler).post(replies_create_handler),
        )
        .route("/{id}/resolve", put(discussions_resolve_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_discussion(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> WebResult<Discussion> {
    Discussion::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Discussion::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/discussions/modules/{module_id}",
    params(
        ("module_id" = Uuid, Path, description = "ID of the module"),
        DiscussionQuery
    ),
    responses(
        (status = 200, description = "Threads of the module, newest first", body = Vec<DiscussionRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn discussions_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(module_id): Path<Uuid>,
    Query(query): Query<DiscussionQuery>,
) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    let threads = DiscussionRow::for_module(state.pool(), module_id, query.is_qa)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok(ApiResponse::ok(threads))
}

#[utoipa::path(
    get,
    path = "/api/discussions/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the discussion")
    ),
    responses(
        (status = 200, description = "Discussion found", body = DiscussionRow),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Discussion not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn discussions_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    ctx.user()?;
    let thread = DiscussionRow::find(state.pool(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Discussion::get_resource_type()))?;

    Ok(ApiResponse::ok(thread))
}

#[utoipa::path(
    post,
    path = "/api/discussions",
    request_body = DiscussionCreate,
    responses(
        (status = 201, description = "Discussion opened", body = Discussion),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn discussions_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<DiscussionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    Validator::new()
        .not_blank("title", &payload.title)
        .not_blank("content", &payload.content)
        .finish()
        .map_err(WebError::validation)?;

    Module::find_by_id(state.pool(), user, payload.module_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Module::get_resource_type()))?;

    let discussion = Discussion::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Discussion created successfully", discussion),
    ))
}

#[utoipa::path(
    put,
    path = "/api/discussions/{id}",
    request_body = DiscussionUpdate,
    params(
        ("id" = Uuid, Path, description = "ID of the discussion")
    ),
    responses(
        (status = 200, description = "Discussion updated", body = Discussion),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Discussion not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn discussions_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<DiscussionUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let discussion = find_discussion(&state, user, id).await?;

    check_access(state.pool(), user, &discussion, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Discussion::get_resource_type(), e))?;

    let updated = discussion
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Discussion updated successfully", updated))
}

#[utoipa::path(
    delete,
    path = "/api/discussions/{id}",
    description = "Author, course instructor or admin may delete a thread",
    params(
        ("id" = Uuid, Path, description = "ID of the discussion")
    ),
    responses(
        (status = 200, description = "Discussion deleted"),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Discussion not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn discussions_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let discussion = find_discussion(&state, user, id).await?;

    let allowed = user.is_admin()
        || discussion.user_id() == user.user_id()
        || discussion
            .course_instructor(state.pool())
            .await
            .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?
            == Some(user.user_id());

    if !allowed {
        return Err(WebError::resource_forbidden(Discussion::get_resource_type()));
    }

    discussion
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok(ApiResponse::message("Discussion deleted successfully"))
}

#[utoipa::path(
    get,
    path = "/api/discussions/{id}/replies",
    params(
        ("id" = Uuid, Path, description = "ID of the discussion")
    ),
    responses(
        (status = 200, description = "Replies, oldest first", body = Vec<DiscussionReplyRow>),
        (status = 404, description = "Discussion not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn replies_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let discussion = find_discussion(&state, user, id).await?;

    let replies = DiscussionReplyRow::for_discussion(state.pool(), discussion.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(DiscussionReply::get_resource_type(), e))?;

    Ok(ApiResponse::ok(replies))
}

#[utoipa::path(
    post,
    path = "/api/discussions/{id}/replies",
    request_body = ReplyBody,
    params(
        ("id" = Uuid, Path, description = "ID of the discussion")
    ),
    responses(
        (status = 201, description = "Reply posted", body = DiscussionReply),
        (status = 400, description = "Empty reply", body = ErrorResponse),
        (status = 404, description = "Discussion not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn replies_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplyBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    Validator::new()
        .not_blank("content", &payload.content)
        .finish()
        .map_err(WebError::validation)?;

    let discussion = find_discussion(&state, user, id).await?;

    let reply = DiscussionReply::create(
        state.pool(),
        DiscussionReplyCreate {
            discussion_id: discussion.id(),
            user_id: user.user_id(),
            content: payload.content,
            is_instructor_reply: user.is_instructor(),
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(DiscussionReply::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Reply posted successfully", reply),
    ))
}

#[utoipa::path(
    put,
    path = "/api/discussions/{id}/resolve",
    params(
        ("id" = Uuid, Path, description = "ID of the discussion")
    ),
    responses(
        (status = 200, description = "Marked as resolved", body = Discussion),
        (status = 403, description = "Instructor or admin only", body = ErrorResponse),
        (status = 404, description = "Discussion not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "discussions"
)]
async fn discussions_resolve_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let discussion = find_discussion(&state, user, id).await?;

    let resolved = discussion
        .resolve(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(Discussion::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Discussion marked as resolved", resolved))
}
