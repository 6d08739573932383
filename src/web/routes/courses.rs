use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped,
        entity::{
            Course, CourseCatalogRow, CourseInstructorRow, Enrollment, LearningProgress,
            LearningProgressUpsert, Lesson, Module, MyCourseRow, Quiz, completion_percentage,
        },
        grading::round_to,
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            courses::{
                CourseDetail, EnrollResponse, LessonView, ModuleContent, ProgressBody,
                ProgressResponse,
            },
        },
        error::{ErrorResponse, FieldError},
        middlewares,
    },
};

/// Routes mounted under `/api/courses`.
pub fn catalog_routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/", get(courses_list_handler))
        .route("/{id}", get(courses_get_handler))
        .route("/{id}/enroll", post(courses_enroll_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Learner routes living at the API root.
pub fn learner_routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/api/my-courses", get(my_courses_handler))
        .route("/api/lessons/{id}", get(lessons_get_handler))
        .route("/api/progress", post(progress_update_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn find_course(state: &AppState, id: Uuid) -> WebResult<Course> {
    Course::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))
}

#[utoipa::path(
    get,
    path = "/api/courses",
    description = "Published courses, newest first",
    responses(
        (status = 200, description = "Course catalog", body = Vec<CourseCatalogRow>),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_list_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let courses = CourseCatalogRow::published(state.pool())
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(ApiResponse::ok(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    description = "Course with its instructor, modules, lessons and quizzes",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseDetail),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "courses"
)]
async fn courses_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let course = find_course(&state, id).await?;
    let mm = state.pool();

    let (instructor, modules, lessons, quizzes) = tokio::try_join!(
        CourseInstructorRow::find(mm, &course),
        Module::for_course(mm, id),
        Lesson::for_course(mm, id),
        Quiz::for_course(mm, id),
    )
    .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(ApiResponse::ok(CourseDetail {
        course,
        instructor_name: instructor.instructor_name,
        instructor_email: instructor.instructor_email,
        modules: ModuleContent::group(modules, lessons, quizzes),
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    description = "Enrolls the caller into a free course",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 201, description = "Enrolled", body = EnrollResponse),
        (status = 400, description = "Payment required or already enrolled", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn courses_enroll_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let course = find_course(&state, id).await?;

    if course.requires_payment() {
        return Err(WebError::resource_bad_request(
            Course::get_resource_type(),
            "This course requires payment. Please use the payment gateway.",
        ));
    }

    let existing = Enrollment::find(state.pool(), user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    if existing.is_some_and(|e| e.status().grants_access()) {
        return Err(WebError::resource_bad_request(
            Enrollment::get_resource_type(),
            "Already enrolled in this course",
        ));
    }

    let enrollment = Enrollment::activate_for(state.pool(), user.user_id(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    tracing::info!("user {} enrolled into free course {}", user.user_id(), id);
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Enrolled successfully",
            EnrollResponse {
                enrollment_id: enrollment.id(),
                enrollment_status: enrollment.status().to_string(),
            },
        ),
    ))
}

#[utoipa::path(
    get,
    path = "/api/my-courses",
    description = "Active and completed enrollments of the student, most recently accessed first",
    responses(
        (status = 200, description = "Enrolled courses", body = Vec<MyCourseRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Students only", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn my_courses_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.student()?;
    let courses = MyCourseRow::for_student(state.pool(), user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    Ok(ApiResponse::ok(courses))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{id}",
    description = "Lesson content; needs an enrollment unless the lesson is a free preview",
    params(
        ("id" = Uuid, Path, description = "ID of the lesson")
    ),
    responses(
        (status = 200, description = "Lesson found", body = LessonView),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Enrollment required", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn lessons_get_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    let lesson = Lesson::find_by_id(mm, user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    let course_id = lesson
        .course_id(mm)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let allowed = lesson.is_free()
        || user.is_admin()
        || Course::instructor_of(mm, course_id)
            .await
            .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
            == Some(user.user_id())
        || Enrollment::grants_access(mm, user.user_id(), course_id)
            .await
            .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    if !allowed {
        return Err(WebError::resource_forbidden_because(
            Lesson::get_resource_type(),
            "Enrollment required to access this lesson",
        ));
    }

    Ok(ApiResponse::ok(LessonView { lesson, course_id }))
}

#[utoipa::path(
    post,
    path = "/api/progress",
    request_body = ProgressBody,
    description = "Records lesson progress and recomputes the course percentage",
    responses(
        (status = 200, description = "Progress stored", body = ProgressResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "courses"
)]
async fn progress_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<ProgressBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    if !(0.0..=100.0).contains(&payload.progress_percentage) {
        return Err(WebError::validation(vec![FieldError::new(
            "progress_percentage",
            "Progress must be between 0 and 100",
        )]));
    }

    let lesson = Lesson::find_by_id(mm, user, payload.lesson_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    let course_id = lesson
        .course_id(mm)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    let enrollment = Enrollment::find(mm, user.user_id(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?
        .filter(|e| e.status().grants_access())
        .ok_or_else(|| {
            WebError::resource_forbidden_because(
                Enrollment::get_resource_type(),
                "Not enrolled in this course",
            )
        })?;

    let lesson_progress = LearningProgress::upsert(
        mm,
        LearningProgressUpsert {
            student_id: user.user_id(),
            lesson_id: lesson.id(),
            enrollment_id: enrollment.id(),
            progress_percentage: payload.progress_percentage,
            last_position_seconds: payload.last_position_seconds.unwrap_or(0),
            time_spent_seconds: payload.time_spent_seconds.unwrap_or(0),
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(LearningProgress::get_resource_type(), e))?;

    enrollment
        .touch(mm)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    let (total, completed) = LearningProgress::course_completion(mm, user.user_id(), course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(LearningProgress::get_resource_type(), e))?;
    let overall_progress = round_to(completion_percentage(total, completed), 2);

    let enrollment = enrollment
        .set_progress(mm, overall_progress)
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    tracing::debug!(
        "progress for enrollment {}: {}% ({})",
        enrollment.id(),
        overall_progress,
        enrollment.status()
    );

    Ok(ApiResponse::with_message(
        "Progress updated successfully",
        ProgressResponse {
            lesson_progress,
            overall_progress,
        },
    ))
}
