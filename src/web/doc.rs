use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::web::routes::{
    admin, assessments, auth, courses, discussions, payments, reviews, xapi,
};

pub struct AuthModifier;

impl Modify for AuthModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(schema) = openapi.components.as_mut() {
            schema.add_security_scheme(
                "cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "SID",
                    "JWT token for current user",
                ))),
            );
            schema.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::profile_get_handler,
        auth::profile_update_handler,
        auth::refresh_token_handler,
        courses::courses_list_handler,
        courses::courses_get_handler,
        courses::courses_enroll_handler,
        courses::my_courses_handler,
        courses::lessons_get_handler,
        courses::progress_update_handler,
        admin::analytics_handler,
        admin::courses_list_handler,
        admin::courses_create_handler,
        admin::courses_update_handler,
        admin::courses_delete_handler,
        admin::course_students_handler,
        admin::modules_create_handler,
        admin::modules_update_handler,
        admin::lessons_create_handler,
        admin::lessons_update_handler,
        admin::quizzes_create_handler,
        admin::questions_create_handler,
        admin::upload_handler,
        admin::users_list_handler,
        admin::users_status_handler,
        assessments::quiz_get_handler,
        assessments::quiz_submit_handler,
        assessments::quiz_attempts_handler,
        discussions::discussions_list_handler,
        discussions::discussions_get_handler,
        discussions::discussions_create_handler,
        discussions::discussions_update_handler,
        discussions::discussions_delete_handler,
        discussions::replies_list_handler,
        discussions::replies_create_handler,
        discussions::discussions_resolve_handler,
        reviews::reviews_recent_handler,
        reviews::course_reviews_handler,
        reviews::my_review_handler,
        reviews::reviews_create_handler,
        reviews::reviews_update_handler,
        reviews::reviews_delete_handler,
        payments::initiate_handler,
        payments::success_handler,
        payments::fail_handler,
        payments::cancel_handler,
        payments::history_handler,
        xapi::track_handler,
        xapi::history_handler,
        xapi::analytics_handler,
    ),
    modifiers(&AuthModifier),
    tags(
        (name = "auth", description = "Registration, sign-in and profile"),
        (name = "courses", description = "Catalog, enrollment and learning progress"),
        (name = "admin", description = "Course authoring and platform management"),
        (name = "assessments", description = "Quizzes and attempts"),
        (name = "discussions", description = "Module discussion threads"),
        (name = "reviews", description = "Course reviews"),
        (name = "payments", description = "SSLCommerz checkout"),
        (name = "xapi", description = "Learning event tracking"),
    )
)]
pub struct ApiDoc;
