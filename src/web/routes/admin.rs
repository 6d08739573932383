use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, PaginatableRepository, ResourceType, ResourceTyped, check_access,
        analytics::PlatformStats,
        entity::{
            Course, CourseCreate, CourseManageRow, CourseStudentRow, CourseUpdate, Lesson,
            LessonCreate, LessonUpdate, Module, ModuleCreate, ModuleUpdate, Quiz, QuizCreate,
            QuizQuestion, QuizQuestionCreate, User,
        },
    },
    utils::uploads,
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            admin::{CourseCreated, UploadResponse, UserStatusBody},
        },
        error::ErrorResponse,
        middlewares,
        routes::{PaginationQuery, public_base_url},
        validate::Validator,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    let upload_limit = state.config().app().max_upload_bytes();

    Router::new()
        .route("/analytics", get(analytics_handler))
        .route("/courses", get(courses_list_handler).post(courses_create_handler))
        .route(
            "/courses/{id}",
            put(courses_update_handler).delete(courses_delete_handler),
        )
        .route("/courses/{id}/students", get(course_students_handler))
        .route("/modules", post(modules_create_handler))
        .route("/modules/{id}", put(modules_update_handler))
        .route("/lessons", post(lessons_create_handler))
        .route("/lessons/{id}", put(lessons_update_handler))
        .route("/quizzes", post(quizzes_create_handler))
        .route("/quizzes/questions", post(questions_create_handler))
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/users", get(users_list_handler))
        .route("/users/{id}/status", put(users_status_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Loads a course the caller may manage: 404 when missing, 403 when owned by
/// another instructor.
async fn owned_course(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Course> {
    let course = Course::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    check_access(state.pool(), user, &course, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access_error(Course::get_resource_type(), e))?;

    Ok(course)
}

async fn owned_module(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> WebResult<Module> {
    let module = Module::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Module::get_resource_type()))?;

    check_access(state.pool(), user, &module, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access_error(Module::get_resource_type(), e))?;

    Ok(module)
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics",
    description = "Platform totals for admins, own-course totals for instructors",
    responses(
        (status = 200, description = "Dashboard numbers", body = PlatformStats),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Instructor or admin only", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn analytics_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let scope = (!user.is_admin()).then(|| user.user_id());

    let stats = PlatformStats::fetch(state.pool(), scope)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(ApiResponse::ok(stats))
}

#[utoipa::path(
    get,
    path = "/api/admin/courses",
    responses(
        (status = 200, description = "Manageable courses", body = Vec<CourseManageRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Instructor or admin only", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn courses_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let courses = CourseManageRow::visible_to(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(ApiResponse::ok(courses))
}

#[utoipa::path(
    post,
    path = "/api/admin/courses",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created", body = CourseCreated),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Instructor or admin only", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn courses_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<CourseCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;

    Validator::new()
        .not_blank("title", &payload.title)
        .check(
            payload.price.is_none_or(|p| p >= 0.0),
            "price",
            "Price must not be negative",
        )
        .finish()
        .map_err(WebError::validation)?;

    let course = Course::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!("course {} created by {}", course.id(), user.user_id());
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Course created successfully",
            CourseCreated {
                course_id: course.id(),
            },
        ),
    ))
}

#[utoipa::path(
    put,
    path = "/api/admin/courses/{id}",
    request_body = CourseUpdate,
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn courses_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<CourseUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let course = owned_course(&state, user, id).await?;

    if payload.price.is_some_and(|p| p < 0.0) {
        return Err(WebError::resource_bad_request(
            Course::get_resource_type(),
            "Price must not be negative",
        ));
    }

    let updated = course
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Course updated successfully", updated))
}

#[utoipa::path(
    delete,
    path = "/api/admin/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn courses_delete_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let course = owned_course(&state, user, id).await?;

    course
        .delete(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?;

    tracing::info!("course {} deleted by {}", id, user.user_id());
    Ok(ApiResponse::message("Course deleted successfully"))
}

#[utoipa::path(
    get,
    path = "/api/admin/courses/{id}/students",
    params(
        ("id" = Uuid, Path, description = "ID of the course")
    ),
    responses(
        (status = 200, description = "Enrolled students, newest first", body = Vec<CourseStudentRow>),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn course_students_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let course = owned_course(&state, user, id).await?;

    let students = CourseStudentRow::for_course(state.pool(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(ResourceType::Enrollment, e))?;

    Ok(ApiResponse::ok(students))
}

#[utoipa::path(
    post,
    path = "/api/admin/modules",
    request_body = ModuleCreate,
    responses(
        (status = 201, description = "Module created", body = Module),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn modules_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<ModuleCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    Validator::new()
        .not_blank("title", &payload.title)
        .finish()
        .map_err(WebError::validation)?;
    owned_course(&state, user, payload.course_id).await?;

    let module = Module::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Module created successfully", module),
    ))
}

#[utoipa::path(
    put,
    path = "/api/admin/modules/{id}",
    request_body = ModuleUpdate,
    params(
        ("id" = Uuid, Path, description = "ID of the module")
    ),
    responses(
        (status = 200, description = "Module updated", body = Module),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn modules_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModuleUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let module = owned_module(&state, user, id).await?;

    let updated = module
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Module::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Module updated successfully", updated))
}

#[utoipa::path(
    post,
    path = "/api/admin/lessons",
    request_body = LessonCreate,
    description = "Creates a lesson; media goes through `/api/admin/upload` first",
    responses(
        (status = 201, description = "Lesson created", body = Lesson),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn lessons_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<LessonCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    Validator::new()
        .not_blank("title", &payload.title)
        .finish()
        .map_err(WebError::validation)?;
    owned_module(&state, user, payload.module_id).await?;

    let lesson = Lesson::create(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Lesson created successfully", lesson),
    ))
}

#[utoipa::path(
    put,
    path = "/api/admin/lessons/{id}",
    request_body = LessonUpdate,
    params(
        ("id" = Uuid, Path, description = "ID of the lesson")
    ),
    responses(
        (status = 200, description = "Lesson updated", body = Lesson),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Lesson not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn lessons_update_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<LessonUpdate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    let lesson = Lesson::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Lesson::get_resource_type()))?;

    check_access(state.pool(), user, &lesson, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access_error(Lesson::get_resource_type(), e))?;

    let updated = lesson
        .update(state.pool(), user, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Lesson::get_resource_type(), e))?;

    Ok(ApiResponse::with_message("Lesson updated successfully", updated))
}

#[utoipa::path(
    post,
    path = "/api/admin/quizzes",
    request_body = QuizCreate,
    responses(
        (status = 201, description = "Quiz created", body = Quiz),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Module not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn quizzes_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<QuizCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    Validator::new()
        .not_blank("title", &payload.title)
        .check(
            payload.passing_score.is_none_or(|s| (0..=100).contains(&s)),
            "passing_score",
            "Passing score must be between 0 and 100",
        )
        .check(
            payload.max_attempts.is_none_or(|n| n > 0),
            "max_attempts",
            "Max attempts must be positive",
        )
        .finish()
        .map_err(WebError::validation)?;
    owned_module(&state, user, payload.module_id).await?;

    let quiz = Quiz::create(state.pool(), payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Quiz created successfully", quiz),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/quizzes/questions",
    request_body = QuizQuestionCreate,
    responses(
        (status = 201, description = "Question added", body = QuizQuestion),
        (status = 403, description = "Not the course owner", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn questions_create_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<QuizQuestionCreate>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;
    Validator::new()
        .not_blank("question_text", &payload.question_text)
        .not_blank("correct_answer", &payload.correct_answer)
        .finish()
        .map_err(WebError::validation)?;

    let quiz = Quiz::find_by_id(state.pool(), payload.quiz_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Quiz::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Quiz::get_resource_type()))?;

    check_access(state.pool(), user, &quiz, Some(user.user_id()))
        .await
        .map_err(|e| WebError::resource_access_error(Quiz::get_resource_type(), e))?;

    let question = QuizQuestion::create(state.pool(), payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(QuizQuestion::get_resource_type(), e))?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Question added successfully", question),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/upload",
    description = "Stores a file from the multipart field `file` and returns its public URL",
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file or extension not allowed", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn upload_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.instructor()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::resource_bad_request(ResourceType::Upload, e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let ext = uploads::allowed_extension(&original).ok_or_else(|| {
            WebError::resource_bad_request(
                ResourceType::Upload,
                "Invalid file type. Only images, videos, PDFs, and documents are allowed.",
            )
        })?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| WebError::resource_bad_request(ResourceType::Upload, e.body_text()))?;

        let filename = uploads::unique_filename(&ext);
        let dir = uploads::ensure_uploads_dir(state.config().app().upload_dir())
            .map_err(WebError::server_io_error)?;
        tokio::fs::write(dir.join(&filename), &bytes)
            .await
            .map_err(WebError::server_io_error)?;

        tracing::info!(
            "{} uploaded {} ({} bytes) as {}",
            user.user_id(),
            original,
            bytes.len(),
            filename
        );

        let url = format!(
            "{}/uploads/{}",
            public_base_url(state.config(), &headers),
            filename
        );
        return Ok((
            StatusCode::CREATED,
            ApiResponse::with_message("File uploaded successfully", UploadResponse { url, filename }),
        ));
    }

    Err(WebError::resource_bad_request(
        ResourceType::Upload,
        "No file uploaded",
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Users page", body = crate::model::Page<User>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn users_list_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<PaginationQuery>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    let page = User::page(state.pool(), user, query.limit(), query.offset())
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    Ok(ApiResponse::ok(page))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{id}/status",
    request_body = UserStatusBody,
    params(
        ("id" = Uuid, Path, description = "ID of the user")
    ),
    responses(
        (status = 200, description = "Status changed", body = User),
        (status = 400, description = "Cannot change own status", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "admin"
)]
async fn users_status_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserStatusBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.admin_user()?;
    if id == user.user_id() {
        return Err(WebError::resource_bad_request(
            User::get_resource_type(),
            "You cannot change your own account status",
        ));
    }

    let found = User::find_by_id(state.pool(), user, id)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(User::get_resource_type()))?;

    let updated = found
        .set_active(state.pool(), payload.is_active)
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?;

    tracing::info!("user {} is_active set to {}", id, payload.is_active);
    Ok(ApiResponse::with_message("User status updated", updated))
}
