mod common;
use axum::http::StatusCode;
use edtech::web::routes::payments::INITIATE_BURST;
use serde_json::json;

use crate::common::{
    Action, Flow, FlowContext, MockGateway, assert_message, login_action, seed_course, seed_user,
    setup_server, setup_server_with_gateway, setup_test_db,
};

fn tran_id(ctx: &FlowContext) -> String {
    ctx.data("checkout")["transaction_id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn route_paid_enrollment_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 1500.0).await;
    let free = seed_course(&pool, instructor, 0.0).await;

    Flow::new()
        .step(
            Action::new("initiate anonymous", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(login_action("learner@example.com"))
        .step(
            Action::new("initiate free course", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": free.course_id}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("initiate unknown course", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": uuid::Uuid::new_v4()}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("initiate", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .assert_body(|body| {
                    let data = &body["data"];
                    assert_eq!(data["amount"], 1500.0);
                    assert_eq!(data["currency"], "BDT");
                    let tran_id = data["transaction_id"].as_str().unwrap();
                    assert!(data["gateway_url"].as_str().unwrap().ends_with(tran_id));
                })
                .with_save_as("checkout"),
        )
        .step(
            Action::new("lesson while on hold", "GET", &format!("/api/lessons/{}", course.lesson_id))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(
            Action::new("callback without val_id", "POST", "/api/payments/success")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx)}))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("callback unknown transaction", "POST", "/api/payments/success")
                .with_form(|_| json!({"tran_id": "TXN-unknown", "val_id": "VAL-1"}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("success callback", "POST", "/api/payments/success")
                .with_form(|ctx| {
                    json!({
                        "tran_id": tran_id(ctx),
                        "val_id": "VAL-1",
                        "bank_tran_id": "BANK-1",
                        "card_type": "VISA-Dutch Bangla",
                        "status": "VALID"
                    })
                })
                .assert_body(assert_message("Payment successful")),
        )
        // IPN arrives for the same payment
        .step(
            Action::new("ipn after success", "POST", "/api/payments/ipn")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx), "val_id": "VAL-1"}))
                .assert_body(assert_message("Payment already processed")),
        )
        // late gateway redirects must not undo a settled payment
        .step(
            Action::new("cancel after success", "POST", "/api/payments/cancel")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx)}))
                .assert_body(|body| {
                    assert_eq!(body["success"], true);
                    assert_eq!(body["message"], "Payment already processed");
                }),
        )
        .step(
            Action::new("fail after success", "POST", "/api/payments/fail")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx)}))
                .assert_body(assert_message("Payment already processed")),
        )
        .step(Action::new("lesson after payment", "GET", &format!("/api/lessons/{}", course.lesson_id)))
        .step(Action::new("my courses", "GET", "/api/my-courses").assert_body(move |body| {
            let rows = body["data"].as_array().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["course_id"], course.course_id.to_string());
            assert_eq!(rows[0]["enrollment_status"], "active");
        }))
        .step(Action::new("history", "GET", "/api/payments/history").assert_body(|body| {
            let rows = body["data"].as_array().unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0]["payment_status"], "success");
            assert_eq!(rows[0]["payment_method"], "VISA-Dutch Bangla");
            assert!(rows[0]["payment_date"].is_string());
        }))
        .step(
            Action::new("initiate again", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .assert_body(assert_message("Already enrolled in this course"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_payment_validation_failure_test() {
    let pool = setup_test_db().await;
    let gateway = MockGateway {
        validation_status: "INVALID_TRANSACTION",
        ..Default::default()
    };
    let mut server = setup_server_with_gateway(&pool, gateway).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 800.0).await;

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(
            Action::new("initiate", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .with_save_as("checkout"),
        )
        .step(
            Action::new("forged success", "POST", "/api/payments/success")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx), "val_id": "VAL-forged"}))
                .assert_body(assert_message("Payment validation failed"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("lesson still locked", "GET", &format!("/api/lessons/{}", course.lesson_id))
                .with_expect(StatusCode::FORBIDDEN),
        )
        .step(Action::new("history", "GET", "/api/payments/history").assert_body(|body| {
            assert_eq!(body["data"][0]["payment_status"], "failed");
        }))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_payment_amount_mismatch_test() {
    let pool = setup_test_db().await;
    let gateway = MockGateway {
        paid_amount: Some(10.0),
        ..Default::default()
    };
    let mut server = setup_server_with_gateway(&pool, gateway).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 800.0).await;

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(
            Action::new("initiate", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .with_save_as("checkout"),
        )
        .step(
            Action::new("underpaid success", "POST", "/api/payments/success")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx), "val_id": "VAL-1"}))
                .assert_body(assert_message("Payment validation failed"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("lesson still locked", "GET", &format!("/api/lessons/{}", course.lesson_id))
                .with_expect(StatusCode::FORBIDDEN),
        )
        // a failed payment is settled too
        .step(
            Action::new("cancel after failure", "POST", "/api/payments/cancel")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx)}))
                .assert_body(assert_message("Payment already processed")),
        )
        .step(Action::new("history", "GET", "/api/payments/history").assert_body(|body| {
            assert_eq!(body["data"][0]["payment_status"], "failed");
        }))
        .run(&mut server, pool)
        .await;
}

#[tokio::test]
async fn route_payment_initiate_rate_limit_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 800.0).await;

    let mut flow = Flow::new().step(login_action("learner@example.com"));
    for _ in 0..INITIATE_BURST {
        flow = flow.step(
            Action::new("initiate within limit", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id})),
        );
    }

    flow.step(
        Action::new("initiate over limit", "POST", "/api/payments/initiate")
            .with_body(json!({"course_id": course.course_id}))
            .with_expect(StatusCode::TOO_MANY_REQUESTS),
    )
    // other payment routes are not limited
    .step(Action::new("history", "GET", "/api/payments/history").assert_body(|body| {
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), INITIATE_BURST as usize);
    }))
    .run(&mut server, pool)
    .await;
}

#[tokio::test]
async fn route_payment_cancel_and_refusal_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 800.0).await;

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(
            Action::new("initiate", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .with_save_as("checkout"),
        )
        .step(
            Action::new("cancel callback", "POST", "/api/payments/cancel")
                .with_form(|ctx| json!({"tran_id": tran_id(ctx)}))
                .assert_body(|body| {
                    assert_eq!(body["success"], false);
                    assert_eq!(body["message"], "Payment cancelled");
                }),
        )
        .step(
            Action::new("fail callback unknown", "POST", "/api/payments/fail")
                .with_form(|_| json!({"tran_id": "TXN-unknown"}))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(Action::new("history", "GET", "/api/payments/history").assert_body(|body| {
            assert_eq!(body["data"][0]["payment_status"], "cancelled");
        }))
        .run(&mut server, pool)
        .await;

    let pool = setup_test_db().await;
    let gateway = MockGateway {
        refuse_sessions: true,
        ..Default::default()
    };
    let mut server = setup_server_with_gateway(&pool, gateway).await;
    let instructor = seed_user(&pool, "teach@example.com", "instructor").await;
    seed_user(&pool, "learner@example.com", "student").await;
    let course = seed_course(&pool, instructor, 800.0).await;

    Flow::new()
        .step(login_action("learner@example.com"))
        .step(
            Action::new("initiate refused", "POST", "/api/payments/initiate")
                .with_body(json!({"course_id": course.course_id}))
                .assert_body(assert_message("Store Credential Error"))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(Action::new("history", "GET", "/api/payments/history").assert_body(|body| {
            assert_eq!(body["data"][0]["payment_status"], "failed");
        }))
        .run(&mut server, pool)
        .await;
}
