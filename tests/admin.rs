mod common;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;

use crate::common::{
    Action, Flow, FlowContext, assert_message, login_action, seed_course, seed_enrollment,
    seed_user, setup_server, setup_test_db,
};

fn saved_id(ctx: &FlowContext, key: &str, field: &str) -> String {
    ctx.data(key)[field].as_str().unwrap().to_string()
}

#[tokio::test]
async fn route_course_authoring_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "rival@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(
            Action::new("create course as student", "POST", "/api/admin/courses")
                .with_body(json!({"title": "Nope"}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_action("teach@example.com"))
        .step(
            Action::new("create course without title", "POST", "/api/admin/courses")
                .with_body(json!({"title": "  "}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("create course", "POST", "/api/admin/courses")
                .with_body(json!({
                    "title": "Async Rust",
                    "description": "Futures from the ground up",
                    "price": 1200.0,
                    "is_free": false,
                    "is_published": true
                }))
                .assert_body(assert_message("Course created successfully"))
                .with_save_as("course")
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("create module", "POST", "/api/admin/modules")
                .with_dyn_body(|ctx| {
                    json!({
                        "course_id": saved_id(ctx, "course", "course_id"),
                        "title": "Executors",
                        "order_index": 1
                    })
                })
                .with_save_as("module")
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("update module", "PUT", "")
                .with_dyn_path(|ctx| format!("/api/admin/modules/{}", saved_id(ctx, "module", "id")))
                .with_body(json!({"description": "Polling and wakers"}))
                .assert_body(|body| {
                    assert_eq!(body["data"]["title"], "Executors");
                    assert_eq!(body["data"]["description"], "Polling and wakers");
                }),
        )
        .step(
            Action::new("create lesson", "POST", "/api/admin/lessons")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": saved_id(ctx, "module", "id"),
                        "title": "What is a future",
                        "content_type": "video",
                        "content_url": "https://cdn.example.com/future.mp4",
                        "duration_minutes": 12
                    })
                })
                .assert_body(|body| {
                    assert_eq!(body["data"]["content_type"], "video");
                    assert_eq!(body["data"]["is_free"], false);
                })
                .with_save_as("lesson")
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("update lesson", "PUT", "")
                .with_dyn_path(|ctx| format!("/api/admin/lessons/{}", saved_id(ctx, "lesson", "id")))
                .with_body(json!({"is_free": true}))
                .assert_body(|body| {
                    assert_eq!(body["data"]["is_free"], true);
                    assert_eq!(body["data"]["title"], "What is a future");
                }),
        )
        .step(
            Action::new("quiz with impossible passing score", "POST", "/api/admin/quizzes")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": saved_id(ctx, "module", "id"),
                        "title": "Checkpoint",
                        "passing_score": 120
                    })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("create quiz", "POST", "/api/admin/quizzes")
                .with_dyn_body(|ctx| {
                    json!({
                        "module_id": saved_id(ctx, "module", "id"),
                        "title": "Checkpoint"
                    })
                })
                .assert_body(|body| {
                    assert_eq!(body["data"]["passing_score"], 70);
                    assert_eq!(body["data"]["max_attempts"], 3);
                    assert_eq!(body["data"]["time_limit_minutes"], 30);
                })
                .with_save_as("quiz")
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("add question", "POST", "/api/admin/quizzes/questions")
                .with_dyn_body(|ctx| {
                    json!({
                        "quiz_id": saved_id(ctx, "quiz", "id"),
                        "question_text": "Who polls a future?",
                        "options": ["The executor", "The future itself"],
                        "correct_answer": "The executor",
                        "points": 2
                    })
                })
                .assert_body(|body| assert_eq!(body["data"]["question_type"], "multiple_choice"))
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("course detail", "GET", "")
                .with_dyn_path(|ctx| format!("/api/courses/{}", saved_id(ctx, "course", "course_id")))
                .assert_body(|body| {
                    let data = &body["data"];
                    assert_eq!(data["price"], 1200.0);
                    assert_eq!(data["is_free"], false);
                    assert_eq!(data["currency"], "BDT");
                    assert_eq!(data["difficulty_level"], "beginner");
                    let module = &data["modules"][0];
                    assert_eq!(module["lessons"].as_array().unwrap().len(), 1);
                    assert_eq!(module["quizzes"].as_array().unwrap().len(), 1);
                }),
        )
        .step(Action::new("my managed courses", "GET", "/api/admin/courses").assert_body(|body| {
            let rows = body["data"].as_array().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["enrollment_count"], 0);
        }))
        .step(login_action("rival@example.com"))
        .step(Action::new("rival sees none", "GET", "/api/admin/courses").assert_body(|body| {
            assert!(body["data"].as_array().unwrap().is_empty());
        }))
        .step(
            Action::new("rival updates course", "PUT", "")
                .with_dyn_path(|ctx| format!("/api/admin/courses/{}", saved_id(ctx, "course", "course_id")))
                .with_body(json!({"title": "Mine now"}))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("rival adds module", "POST", "/api/admin/modules")
                .with_dyn_body(|ctx| {
                    json!({"course_id": saved_id(ctx, "course", "course_id"), "title": "Intruder"})
                })
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_action("teach@example.com"))
        .step(
            Action::new("negative price", "PUT", "")
                .with_dyn_path(|ctx| format!("/api/admin/courses/{}", saved_id(ctx, "course", "course_id")))
                .with_body(json!({"price": -5.0}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("make course free", "PUT", "")
                .with_dyn_path(|ctx| format!("/api/admin/courses/{}", saved_id(ctx, "course", "course_id")))
                .with_body(json!({"is_free": true}))
                .assert_body(|body| {
                    assert_eq!(body["data"]["price"], 0.0);
                    assert_eq!(body["data"]["title"], "Async Rust");
                }),
        )
        .step(
            Action::new("delete course", "DELETE", "")
                .with_dyn_path(|ctx| format!("/api/admin/courses/{}", saved_id(ctx, "course", "course_id")))
                .assert_body(assert_message("Course deleted successfully")),
        )
        .step(
            Action::new("deleted course", "GET", "")
                .with_dyn_path(|ctx| format!("/api/courses/{}", saved_id(ctx, "course", "course_id")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_dashboard_and_students_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    let rival = seed_user(&pool, "rival@example.com", "instructor").await;
    seed_user(&pool, "root@example.com", "admin").await;
    let student = seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 0.0).await;
    let other = seed_course(&pool, rival, 0.0).await;
    seed_enrollment(&pool, student, course.course_id, "active").await;
    seed_enrollment(&pool, student, other.course_id, "active").await;
    sqlx::query("UPDATE enrollments SET progress_percentage = 40 WHERE course_id = $1")
        .bind(course.course_id)
        .execute(pool.pool())
        .await
        .unwrap();

    let students_path = format!("/api/admin/courses/{}/students", course.course_id);

    Flow::new()
        .step(login_action("teach@example.com"))
        .step(Action::new("instructor analytics", "GET", "/api/admin/analytics").assert_body(
            |body| {
                assert_eq!(body["data"]["totalStudents"], 1);
                assert_eq!(body["data"]["totalRevenue"], 0.0);
                assert_eq!(body["data"]["avgCompletionRate"], 40);
            },
        ))
        .step(Action::new("course students", "GET", &students_path).assert_body(|body| {
            let rows = body["data"].as_array().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["email"], "learner@example.com");
            assert_eq!(rows[0]["progress_percentage"], 40.0);
        }))
        .step(
            Action::new("users as instructor", "GET", "/api/admin/users")
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(login_action("rival@example.com"))
        .step(Action::new("rival students", "GET", &students_path).with_expect(StatusCode::FORBIDDEN))
        .step(login_action("root@example.com"))
        // platform wide: mean of 40 and 0
        .step(Action::new("admin analytics", "GET", "/api/admin/analytics").assert_body(|body| {
            assert_eq!(body["data"]["totalStudents"], 1);
            assert_eq!(body["data"]["avgCompletionRate"], 20);
        }))
        .step(Action::new("admin sees every course", "GET", "/api/admin/courses").assert_body(
            |body| assert_eq!(body["data"].as_array().unwrap().len(), 2),
        ))
        .step(Action::new("admin reads students", "GET", &students_path))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_user_management_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let admin = seed_user(&pool, "root@example.com", "admin").await;
    let student = seed_user(&pool, "learner@example.com", "student").await;
    seed_user(&pool, "teach@example.com", "instructor").await;

    Flow::new()
        .step(login_action("root@example.com"))
        .step(
            Action::new("users page", "GET", "/api/admin/users")
                .with_param("limit", "2")
                .assert_body(|body| {
                    assert_eq!(body["data"]["total"], 3);
                    assert_eq!(body["data"]["limit"], 2);
                    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
                }),
        )
        .step(
            Action::new("disable self", "PUT", &format!("/api/admin/users/{admin}/status"))
                .with_body(json!({"is_active": false}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("disable student", "PUT", &format!("/api/admin/users/{student}/status"))
                .with_body(json!({"is_active": false}))
                .assert_body(|body| assert_eq!(body["data"]["is_active"], false)),
        )
        .step(
            Action::new("unknown user", "PUT", &format!("/api/admin/users/{}/status", uuid::Uuid::new_v4()))
                .with_body(json!({"is_active": false}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(login_action("learner@example.com").with_expect(StatusCode::FORBIDDEN))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_upload_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    seed_user(&pool, "teach@example.com", "instructor").await;

    Flow::new()
        .step(login_action("teach@example.com"))
        .step(
            Action::new("upload script", "POST", "/api/admin/upload")
                .with_multipart(|| {
                    MultipartForm::new().add_part(
                        "file",
                        Part::bytes(b"#!/bin/sh".to_vec()).file_name("run.sh"),
                    )
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("upload without file", "POST", "/api/admin/upload")
                .with_multipart(|| MultipartForm::new().add_text("note", "nothing here"))
                .assert_body(assert_message("No file uploaded"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("upload pdf", "POST", "/api/admin/upload")
                .with_multipart(|| {
                    MultipartForm::new().add_part(
                        "file",
                        Part::bytes(b"%PDF-1.4 syllabus".to_vec())
                            .file_name("Syllabus.PDF")
                            .mime_type("application/pdf"),
                    )
                })
                .assert_body(|body| {
                    let filename = body["data"]["filename"].as_str().unwrap();
                    assert!(filename.ends_with(".pdf"));
                    assert!(body["data"]["url"].as_str().unwrap().ends_with(filename));
                })
                .with_save_as("upload")
                .with_expect(StatusCode::CREATED),
        )
        .step(
            Action::new("serve upload", "GET", "")
                .with_dyn_path(|ctx| format!("/uploads/{}", saved_id(ctx, "upload", "filename"))),
        )
        .run(&mut server, pool)
        .await;
}
