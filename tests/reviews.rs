mod common;
use axum::http::StatusCode;
use serde_json::json;

use crate::common::{
    Action, Flow, assert_message, login_action, seed_course, seed_enrollment, seed_user,
    setup_server, setup_test_db,
};

#[tokio::test]
async fn route_reviews_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    let first = seed_user(&pool, "first@example.com", "student").await;
    let second = seed_user(&pool, "second@example.com", "student").await;
    seed_user(&pool, "outsider@example.com", "student").await;
    let course = seed_course(&pool, instructor, 0.0).await;
    seed_enrollment(&pool, first, course.course_id, "active").await;
    seed_enrollment(&pool, second, course.course_id, "completed").await;

    let course_reviews = format!("/api/reviews/courses/{}", course.course_id);
    let mine = format!("{course_reviews}/mine");

    Flow::new()
        .step(Action::new("no reviews yet", "GET", &course_reviews).assert_body(|body| {
            assert_eq!(body["data"]["total_reviews"], 0);
            assert!(body["data"]["avg_rating"].is_null());
        }))
        .step(login_action("outsider@example.com"))
        .step(
            Action::new("review without enrollment", "POST", &course_reviews)
                .with_body(json!({"rating": 5}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_action("first@example.com"))
        .step(
            Action::new("rating out of range", "POST", &course_reviews)
                .with_body(json!({"rating": 6}))
                .assert_body(assert_message("Rating must be between 1 and 5"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("first review", "POST", &course_reviews)
                .with_body(json!({"rating": 5, "review_text": "Great pacing"}))
                .with_save_as("first_review")
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("review twice", "POST", &course_reviews)
                .with_body(json!({"rating": 3}))
                .assert_body(assert_message("You have already reviewed this course"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(Action::new("my review", "GET", &mine).assert_body(|body| {
            assert_eq!(body["data"]["rating"], 5);
            assert_eq!(body["data"]["review_text"], "Great pacing");
        }))
        // completed enrollments may review too
        .step(login_action("second@example.com"))
        .step(Action::new("my review before writing", "GET", &mine).assert_body(|body| {
            assert!(body["data"].is_null());
        }))
        .step(
            Action::new("second review", "POST", &course_reviews)
                .with_body(json!({"rating": 2}))
                .with_save_as("second_review")
                .with_expect(StatusCode::CREATED),
        )
        .step(Action::new("course reviews", "GET", &course_reviews).assert_body(|body| {
            assert_eq!(body["data"]["total_reviews"], 2);
            assert_eq!(body["data"]["avg_rating"], 3.5);
            let reviews = body["data"]["reviews"].as_array().unwrap();
            assert!(reviews.iter().all(|r| r["user_name"].is_string()));
        }))
        .step(
            Action::new("edit someone else's review", "PUT", "")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/reviews/{}",
                        ctx.data("first_review")["review_id"].as_str().unwrap()
                    )
                })
                .with_body(json!({"rating": 1}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("edit own review", "PUT", "")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/reviews/{}",
                        ctx.data("second_review")["review_id"].as_str().unwrap()
                    )
                })
                .with_body(json!({"rating": 4, "review_text": "Better on second look"}))
                .assert_body(|body| assert_eq!(body["data"]["rating"], 4)),
        )
        // only reviews rated 4 or higher reach the landing page
        .step(
            Action::new("recent reviews", "GET", "/api/reviews/all")
                .with_param("limit", "10")
                .assert_body(|body| {
                    let reviews = body["data"].as_array().unwrap();
                    assert_eq!(reviews.len(), 2);
                    assert!(reviews.iter().all(|r| r["rating"].as_i64().unwrap() >= 4));
                }),
        )
        .step(
            Action::new("delete own review", "DELETE", "")
                .with_dyn_path(|ctx| {
                    format!(
                        "/api/reviews/{}",
                        ctx.data("second_review")["review_id"].as_str().unwrap()
                    )
                })
                .assert_body(assert_message("Review deleted successfully")),
        )
        .step(Action::new("course reviews after delete", "GET", &course_reviews).assert_body(
            |body| {
                assert_eq!(body["data"]["total_reviews"], 1);
                assert_eq!(body["data"]["avg_rating"], 5.0);
            },
        ))
        .run(&mut server, pool)
        .await;
}
