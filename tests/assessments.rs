mod common;
use axum::http::StatusCode;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::common::{
    Action, Flow, assert_message, login_action, seed_course, seed_enrollment, seed_user,
    setup_server, setup_test_db,
};

fn answers(pairs: &[(Uuid, &str)]) -> Value {
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(id, answer)| (id.to_string(), Value::from(*answer)))
        .collect();
    Value::Object(map)
}

#[tokio::test]
async fn route_quiz_requires_enrollment_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 0.0).await;

    let quiz_path = format!("/api/assessments/quizzes/{}", course.quiz_id);

    Flow::new()
        .step(
            Action::new("quiz anonymous", "GET", &quiz_path).with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(login_action("learner@example.com"))
        .step(
            Action::new("quiz before enroll", "GET", &quiz_path)
                .assert_body(assert_message("Enrollment required to access this quiz"))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("submit before enroll", "POST", &format!("{quiz_path}/submit"))
                .with_body(json!({ "answers": {} }))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // the owner can preview without enrolling
        .step(login_action("teach@example.com"))
        .step(Action::new("quiz as owner", "GET", &quiz_path))
        .step(
            Action::new(
                "unknown quiz",
                "GET",
                &format!("/api/assessments/quizzes/{}", Uuid::new_v4()),
            )
            .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_attempts_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    let student = seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 0.0).await;
    seed_enrollment(&pool, student, course.course_id, "active").await;

    let quiz_path = format!("/api/assessments/quizzes/{}", course.quiz_id);
    let submit_path = format!("{quiz_path}/submit");
    let (easy, hard) = (course.easy_question_id, course.hard_question_id);

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(Action::new("quiz", "GET", &quiz_path).assert_body(|body| {
            let data = &body["data"];
            assert_eq!(data["attempts_count"], 0);
            assert_eq!(data["max_attempts"], 2);
            let questions = data["questions"].as_array().unwrap();
            assert_eq!(questions.len(), 2);
            for q in questions {
                assert!(q.get("correct_answer").is_none());
                assert!(q.get("explanation").is_none());
            }
        }))
        // 3 of 4 points
        .step(
            Action::new("submit passing", "POST", &submit_path)
                .with_body(json!({
                    "answers": answers(&[(hard, "B"), (easy, "C")]),
                    "time_taken_seconds": 90
                }))
                .assert_body(move |body| {
                    let data = &body["data"];
                    assert_eq!(data["score"], 75.0);
                    assert_eq!(data["passed"], true);
                    assert_eq!(data["attempt_number"], 1);
                    assert_eq!(data["remaining_attempts"], 1);

                    let feedback = data["feedback"].as_array().unwrap();
                    let easy_fb = feedback
                        .iter()
                        .find(|f| f["question_id"] == easy.to_string())
                        .unwrap();
                    assert_eq!(easy_fb["is_correct"], false);
                    assert_eq!(easy_fb["correct_answer"], "A");
                    assert_eq!(easy_fb["points_earned"], 0);
                })
                .assert_body(assert_message("Quiz passed! Congratulations!")),
        )
        // unanswered questions count as wrong
        .step(
            Action::new("submit failing", "POST", &submit_path)
                .with_body(json!({ "answers": answers(&[(easy, "A")]) }))
                .assert_body(|body| {
                    assert_eq!(body["data"]["score"], 25.0);
                    assert_eq!(body["data"]["passed"], false);
                    assert_eq!(body["data"]["attempt_number"], 2);
                    assert_eq!(body["data"]["remaining_attempts"], 0);
                })
                .assert_body(assert_message("Quiz completed. Keep trying!")),
        )
        .step(
            Action::new("submit over limit", "POST", &submit_path)
                .with_body(json!({ "answers": {} }))
                .assert_body(assert_message("Maximum attempts (2) reached"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("attempts", "GET", &format!("{quiz_path}/attempts")).assert_body(|body| {
                let attempts = body["data"].as_array().unwrap();
                assert_eq!(attempts.len(), 2);
                let mut numbers: Vec<i64> = attempts
                    .iter()
                    .map(|a| a["attempt_number"].as_i64().unwrap())
                    .collect();
                numbers.sort();
                assert_eq!(numbers, vec![1, 2]);
            }),
        )
        .step(
            Action::new("quiz after attempts", "GET", &quiz_path)
                .assert_body(|body| assert_eq!(body["data"]["attempts_count"], 2)),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_quiz_concurrent_attempt_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    let student = seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 0.0).await;
    seed_enrollment(&pool, student, course.course_id, "active").await;

    // an attempt numbered 2 already landed while the count still reads 1
    sqlx::query(
        r#"
        INSERT INTO quiz_attempts (id, quiz_id, student_id, score, passed, attempt_number)
        VALUES ($1, $2, $3, 0, false, 2)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(course.quiz_id)
    .bind(student)
    .execute(pool.pool())
    .await
    .unwrap();

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(
            Action::new(
                "submit colliding attempt",
                "POST",
                &format!("/api/assessments/quizzes/{}/submit", course.quiz_id),
            )
            .with_body(json!({ "answers": answers(&[(course.easy_question_id, "A")]) }))
            .assert_body(assert_message("Another attempt was submitted at the same time"))
            .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}
