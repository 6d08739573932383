use axum::{
    Json, Router,
    extract::{Path, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        DatabaseError, ResourceTyped,
        entity::{Enrollment, Quiz, QuizAttempt, QuizAttemptCreate, QuizQuestion, QuizQuestionPublic},
        grading::{self, GradableQuestion, round_to},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            assessments::{QuizView, SubmitBody, SubmitResult},
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/quizzes/{id}", get(quiz_get_handler))
        .route("/quizzes/{id}/submit", post(quiz_submit_handler))
        .route("/quizzes/{id}/attempts", get(quiz_attempts_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Loads a quiz the caller may take: the course instructor and admins always
/// can, everyone else needs an active or completed enrollment.
async fn accessible_quiz(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Quiz> {
    let mm = state.pool();
    let quiz = Quiz::find_by_id(mm, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Quiz::get_resource_type()))?;

    if user.is_admin() {
        return Ok(quiz);
    }

    let (course_id, instructor) = quiz
        .course_of(mm)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    if instructor == Some(user.user_id()) {
        return Ok(quiz);
    }

    let enrolled = Enrollment::grants_access(mm, user.user_id(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    if !enrolled {
        return Err(WebError::resource_forbidden_because(
            Quiz::get_resource_type(),
            "Enrollment required to access this quiz",
        ));
    }

    Ok(quiz)
}

#[utoipa::path(
    get,
    path = "/api/assessments/quizzes/{id}",
    description = "Quiz with its questions (answers hidden) and the caller's attempt count",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Quiz found", body = QuizView),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Enrollment required", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn quiz_get_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = accessible_quiz(&state, user, id).await?;
    let mm = state.pool();

    let (questions, attempts_count) = tokio::try_join!(
        QuizQuestion::for_quiz(mm, id),
        QuizAttempt::count_for(mm, id, user.user_id()),
    )
    .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?;

    Ok(ApiResponse::ok(QuizView {
        quiz,
        questions: questions.into_iter().map(QuizQuestionPublic::from).collect(),
        attempts_count,
    }))
}

#[utoipa::path(
    post,
    path = "/api/assessments/quizzes/{id}/submit",
    request_body = SubmitBody,
    description = "Grades the answers and stores the attempt",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Attempt graded", body = SubmitResult),
        (status = 400, description = "No attempts left", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Enrollment required", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn quiz_submit_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let quiz = accessible_quiz(&state, user, id).await?;
    let mm = state.pool();

    let previous = QuizAttempt::count_for(mm, id, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?;

    let max_attempts = i64::from(quiz.max_attempts());
    if previous >= max_attempts {
        return Err(WebError::resource_bad_request(
            QuizAttempt::get_resource_type(),
            format!("Maximum attempts ({max_attempts}) reached"),
        ));
    }

    let questions: Vec<GradableQuestion> = QuizQuestion::for_quiz(mm, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?
        .into_iter()
        .map(GradableQuestion::from)
        .collect();

    let report = grading::grade(&questions, &payload.answers, quiz.passing_score());
    let score = round_to(report.percentage, 2);
    let attempt_number = (previous + 1) as i32;

    let answers = serde_json::to_value(&payload.answers)
        .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), DatabaseError::from(e)))?;

    let attempt = QuizAttempt::create(
        mm,
        QuizAttemptCreate {
            quiz_id: id,
            student_id: user.user_id(),
            score,
            passed: report.passed,
            answers,
            time_taken_seconds: payload.time_taken_seconds,
            attempt_number,
        },
    )
    .await
    .map_err(|e| {
        if e.is_unique_violation() {
            WebError::resource_bad_request(
                QuizAttempt::get_resource_type(),
                "Another attempt was submitted at the same time",
            )
        } else {
            WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e)
        }
    })?;

    tracing::info!(
        "quiz {} attempt {} by {}: {}/{} points",
        id,
        attempt.attempt_number(),
        user.user_id(),
        report.earned,
        report.max
    );

    let message = if attempt.passed() {
        "Quiz passed! Congratulations!"
    } else {
        "Quiz completed. Keep trying!"
    };

    Ok(ApiResponse::with_message(
        message,
        SubmitResult {
            score: attempt.score(),
            passing_score: quiz.passing_score(),
            passed: attempt.passed(),
            feedback: report.feedback,
            attempt_number: attempt.attempt_number(),
            remaining_attempts: (quiz.max_attempts() - attempt.attempt_number()).max(0),
        },
    ))
}

#[utoipa::path(
    get,
    path = "/api/assessments/quizzes/{id}/attempts",
    params(
        ("id" = Uuid, Path, description = "ID of the quiz")
    ),
    responses(
        (status = 200, description = "Caller's attempts, latest first", body = Vec<QuizAttempt>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "assessments"
)]
async fn quiz_attempts_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let attempts = QuizAttempt::list_for(state.pool(), id, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizAttempt::get_resource_type(), e))?;

    Ok(ApiResponse::ok(attempts))
}
