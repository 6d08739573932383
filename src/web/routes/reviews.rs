use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{
            Course, Enrollment, MAX_RATING, MIN_RATING, RecentReviewRow, Review, ReviewCreate,
            ReviewRow, ReviewUpdate, is_valid_rating,
        },
        grading::round_to,
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            reviews::{
                CourseReviews, DEFAULT_RECENT_LIMIT, RecentReviewsQuery, ReviewBody,
                ReviewCreated,
            },
        },
        error::ErrorResponse,
        middlewares,
    },
};

const MAX_RECENT_LIMIT: i64 = 50;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/all", get(reviews_recent_handler))
        .route(
            "/courses/{id}",
            get(course_reviews_handler).post(reviews_create_handler),
        )
        .route("/courses/{id}/mine", get(my_review_handler))
        .route(
            "/{id}",
            put(reviews_update_handler).delete(reviews_delete_handler),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn rating_out_of_range() -> WebError {
    WebError::resource_bad_request(
        Review::get_resource_type(),
        format!("Rating must be between {MIN_RATING} and {MAX_RATING}"),
    )
}

async fn owned_review(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Review> {
    let review = Review::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Review::get_resource_type()))?;

    check_access(state.pool(), user, &review, user.user_id())
        .await
        .map_err(|e| WebError::resource_access_error(Review::get_resource_type(), e))?;

    Ok(review)
}

#[utoipa::path(
    get,
    path = "/api/reviews/all",
    params(RecentReviewsQuery),
    description = "Recent reviews rated 4 or higher, for the landing page",
    responses(
        (status = 200, description = "Recent reviews", body = Vec<RecentReviewRow>),
    ),
    tag = "reviews"
)]
async fn reviews_recent_handler(
    State(state): State<AppState>,
    Query(query): Query<RecentReviewsQuery>,
) -> WebResult<impl IntoResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);

    let reviews = RecentReviewRow::top_recent(state.pool(), limit)
        .await
        .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?;

    Ok(ApiResponse::ok(reviews))
}

#[utoipa::path(
    get,
    path = "/api/reviews/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Reviews with the average rating", body = CourseReviews),
    ),
    tag = "reviews"
)]
async fn course_reviews_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let mm = state.pool();
    let (reviews, (avg_rating, total_reviews)) =
        tokio::try_join!(ReviewRow::for_course(mm, id), Review::stats(mm, id))
            .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?;

    Ok(ApiResponse::ok(CourseReviews {
        reviews,
        avg_rating: avg_rating.map(|avg| round_to(avg, 1)),
        total_reviews,
    }))
}

#[utoipa::path(
    get,
    path = "/api/reviews/courses/{id}/mine",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Caller's review or null", body = Option<Review>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
async fn my_review_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let review = Review::find_for(state.pool(), id, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?;

    // `data: null` when the caller has not reviewed the course
    Ok(ApiResponse::ok(review))
}

#[utoipa::path(
    post,
    path = "/api/reviews/courses/{id}",
    request_body = ReviewBody,
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Review stored", body = ReviewCreated),
        (status = 400, description = "Rating out of range or already reviewed", body = ErrorResponse),
        (status = 403, description = "Enrollment required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
async fn reviews_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    if !is_valid_rating(payload.rating) {
        return Err(rating_out_of_range());
    }

    Course::find_by_id(mm, user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    if !user.is_admin() {
        let enrolled = Enrollment::grants_access(mm, user.user_id(), id)
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
        if !enrolled {
            return Err(WebError::resource_forbidden_because(
                Review::get_resource_type(),
                "You must be enrolled in this course to leave a review",
            ));
        }
    }

    let already_reviewed = || {
        WebError::resource_bad_request(
            Review::get_resource_type(),
            "You have already reviewed this course",
        )
    };

    let existing = Review::find_for(mm, id, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?;
    if existing.is_some() {
        return Err(already_reviewed());
    }

    let data = ReviewCreate {
        course_id: id,
        rating: payload.rating,
        review_text: payload.review_text,
    };
    let review = Review::create(mm, user, data).await.map_err(|e| {
        if e.is_unique_violation() {
            already_reviewed()
        } else {
            WebError::resource_fetch_error(Review::get_resource_type(), e)
        }
    })?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Review submitted successfully",
            ReviewCreated {
                review_id: review.id(),
            },
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    request_body = ReviewUpdate,
    params(
        ("id" = Uuid, Path, description = "ID of the review")
    ),
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 400, description = "Rating out of range", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
async fn reviews_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;

    if payload.rating.is_some_and(|r| !is_valid_rating(r)) {
        return Err(rating_out_of_range());
    }

    let review = owned_review(&state, user, id).await?;
    let updated = review
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Review updated successfully", updated))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the review")
    ),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "reviews"
)]
async fn reviews_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let review = owned_review(&state, user, id).await?;

    review
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Review::get_resource_type(), e))?;

    Ok(ApiResponse::message("Review deleted successfully"))
}
