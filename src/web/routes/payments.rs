use axum::{
    Form, Json, Router,
    extract::State,
    http::HeaderMap,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};

use crate::{
    auth,
    model::{
        CrudRepository, ResourceTyped,
        entity::{
            Course, Enrollment, Transaction, TransactionCreate, TransactionHistoryRow,
            TransactionSettlement, TransactionStatus, User, new_session_id,
        },
    },
    payment::SessionRequest,
    web::{
        AppState, RequestContext, WebError, WebResult,
        dto::{
            ApiResponse,
            payments::{GatewayCallback, InitiateBody, InitiateResponse},
        },
        error::ErrorResponse,
        middlewares,
        routes::public_base_url,
    },
};

/// Payment initiations allowed per client address in one window.
pub const INITIATE_BURST: u32 = 10;
/// The window is 15 minutes; one request is replenished every period.
const INITIATE_REPLENISH_SECS: u64 = 15 * 60 / INITIATE_BURST as u64;

pub fn routes<S>(state: AppState) -> Router<S> {
    let initiate = post(initiate_handler);
    let initiate = match GovernorConfigBuilder::default()
        .key_extractor(SmartIpKeyExtractor)
        .per_second(INITIATE_REPLENISH_SECS)
        .burst_size(INITIATE_BURST)
        .finish()
    {
        Some(config) => initiate.layer(GovernorLayer::new(config)),
        None => {
            tracing::warn!("payment initiation is not rate limited");
            initiate
        }
    };

    Router::new()
        .route("/initiate", initiate)
        .route("/success", post(success_handler))
        .route("/ipn", post(success_handler))
        .route("/fail", post(fail_handler))
        .route("/cancel", post(cancel_handler))
        .route("/history", get(history_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn missing_field(field: &str) -> WebError {
    WebError::resource_bad_request(
        Transaction::get_resource_type(),
        format!("Missing {field} in gateway callback"),
    )
}

#[utoipa::path(
    post,
    path = "/api/payments/initiate",
    request_body = InitiateBody,
    description = "Opens a gateway session for a paid course",
    responses(
        (status = 200, description = "Gateway session opened", body = InitiateResponse),
        (status = 400, description = "Already enrolled, free course or gateway refused", body = ErrorResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 429, description = "Too many payment attempts"),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "payments"
)]
async fn initiate_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    Json(payload): Json<InitiateBody>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let mm = state.pool();

    let course = Course::find_by_id(mm, user, payload.course_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Course::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Course::get_resource_type()))?;

    if !course.requires_payment() {
        return Err(WebError::resource_bad_request(
            Course::get_resource_type(),
            "This course is free. Enroll directly instead.",
        ));
    }

    let existing = Enrollment::find(mm, user.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;
    if existing.is_some_and(|e| e.status().grants_access()) {
        return Err(WebError::resource_bad_request(
            Enrollment::get_resource_type(),
            "Already enrolled in this course",
        ));
    }

    let student = User::find_by_id(mm, user, user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(User::get_resource_type(), e))?
        .ok_or_else(WebError::auth_token_invalid)?;

    let enrollment = Enrollment::hold(mm, user.user_id(), course.id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    let transaction = Transaction::create_pending(
        mm,
        TransactionCreate {
            enrollment_id: enrollment.id(),
            student_id: user.user_id(),
            course_id: course.id(),
            amount: course.price(),
            currency: course.currency().to_string(),
            session_id: new_session_id(),
        },
    )
    .await
    .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?;

    let base = format!("{}/api/payments", public_base_url(state.config(), &headers));
    let request = SessionRequest {
        tran_id: transaction.session_id().to_string(),
        total_amount: transaction.amount(),
        currency: transaction.currency().to_string(),
        product_name: course.title().to_string(),
        cus_name: student.full_name().to_string(),
        cus_email: student.email().to_string(),
        cus_phone: student.phone().unwrap_or("01700000000").to_string(),
        success_url: format!("{base}/success"),
        fail_url: format!("{base}/fail"),
        cancel_url: format!("{base}/cancel"),
        ipn_url: format!("{base}/ipn"),
        value_a: transaction.id().to_string(),
        value_b: enrollment.id().to_string(),
        value_c: course.id().to_string(),
    };

    let session = state
        .gateway()
        .create_session(&request)
        .await
        .map_err(WebError::server_payment_error)?;

    let Some(gateway_url) = session.gateway_page_url.clone().filter(|_| session.is_success())
    else {
        tracing::warn!(
            "gateway refused session {}: {:?}",
            transaction.session_id(),
            session.failed_reason
        );
        Transaction::close_pending(mm, transaction.session_id(), TransactionStatus::Failed)
            .await
            .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?;
        return Err(WebError::resource_bad_request(
            Transaction::get_resource_type(),
            session
                .failed_reason
                .unwrap_or_else(|| String::from("Payment initialization failed")),
        ));
    };

    tracing::info!(
        "payment session {} opened for course {} by {}",
        transaction.session_id(),
        course.id(),
        user.user_id()
    );

    Ok(ApiResponse::ok(InitiateResponse {
        gateway_url,
        transaction_id: transaction.session_id().to_string(),
        amount: transaction.amount(),
        currency: transaction.currency().to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/payments/success",
    request_body(content = GatewayCallback, content_type = "application/x-www-form-urlencoded"),
    description = "Gateway callback; also mounted at `/api/payments/ipn`",
    responses(
        (status = 200, description = "Payment validated, enrollment active"),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown transaction", body = ErrorResponse),
        (status = 502, description = "Gateway unreachable", body = ErrorResponse),
    ),
    tag = "payments"
)]
async fn success_handler(
    State(state): State<AppState>,
    Form(callback): Form<GatewayCallback>,
) -> WebResult<impl IntoResponse> {
    let mm = state.pool();
    let val_id = callback.val_id.ok_or_else(|| missing_field("val_id"))?;
    let tran_id = callback.tran_id.ok_or_else(|| missing_field("tran_id"))?;

    let transaction = Transaction::find_by_session(mm, &tran_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Transaction::get_resource_type()))?;

    // success and IPN both arrive for one payment
    if transaction.status() == TransactionStatus::Success {
        return Ok(ApiResponse::message("Payment already processed"));
    }

    let validation = state
        .gateway()
        .validate(&val_id)
        .await
        .map_err(WebError::server_payment_error)?;

    let confirmed = validation.confirms(&tran_id, transaction.amount(), transaction.currency());

    if !validation.is_valid() || !confirmed {
        tracing::warn!(
            "payment {} failed validation with status {} (confirmed: {})",
            tran_id,
            validation.status,
            confirmed
        );
        Transaction::close_pending(mm, &tran_id, TransactionStatus::Failed)
            .await
            .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?;
        return Err(WebError::resource_bad_request(
            Transaction::get_resource_type(),
            "Payment validation failed",
        ));
    }

    let token_secret = state.config().app().token_secret();
    let transaction = transaction
        .settle(
            mm,
            TransactionSettlement {
                gateway_transaction_id: callback.bank_tran_id,
                validation_token: auth::fingerprint(&val_id, token_secret),
                payment_method: callback.card_type,
            },
        )
        .await
        .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?;

    Enrollment::activate(mm, transaction.enrollment_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Enrollment::get_resource_type(), e))?;

    tracing::info!(
        "payment {} settled, enrollment {} active",
        tran_id,
        transaction.enrollment_id()
    );
    Ok(ApiResponse::message(
        "Payment successful. You are now enrolled in the course.",
    ))
}

/// Moves a pending transaction to `status`. Returns false when the transaction
/// was already settled and is left untouched.
async fn close_transaction(
    state: &AppState,
    callback: GatewayCallback,
    status: TransactionStatus,
) -> WebResult<bool> {
    let mm = state.pool();
    let tran_id = callback.tran_id.ok_or_else(|| missing_field("tran_id"))?;
    let transaction = Transaction::find_by_session(mm, &tran_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Transaction::get_resource_type()))?;

    if transaction.status() != TransactionStatus::Pending {
        tracing::warn!(
            "ignoring {} callback for {} payment {}",
            status,
            transaction.status(),
            tran_id
        );
        return Ok(false);
    }

    let closed = Transaction::close_pending(mm, &tran_id, status)
        .await
        .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?;

    if closed {
        tracing::info!("payment {} marked {}", tran_id, status);
    }
    Ok(closed)
}

#[utoipa::path(
    post,
    path = "/api/payments/fail",
    request_body(content = GatewayCallback, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Transaction marked failed, or already settled"),
        (status = 404, description = "Unknown transaction", body = ErrorResponse),
    ),
    tag = "payments"
)]
async fn fail_handler(
    State(state): State<AppState>,
    Form(callback): Form<GatewayCallback>,
) -> WebResult<impl IntoResponse> {
    if !close_transaction(&state, callback, TransactionStatus::Failed).await? {
        return Ok(ApiResponse::message("Payment already processed"));
    }
    Ok(ApiResponse::failure("Payment failed"))
}

#[utoipa::path(
    post,
    path = "/api/payments/cancel",
    request_body(content = GatewayCallback, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Transaction marked cancelled, or already settled"),
        (status = 404, description = "Unknown transaction", body = ErrorResponse),
    ),
    tag = "payments"
)]
async fn cancel_handler(
    State(state): State<AppState>,
    Form(callback): Form<GatewayCallback>,
) -> WebResult<impl IntoResponse> {
    if !close_transaction(&state, callback, TransactionStatus::Cancelled).await? {
        return Ok(ApiResponse::message("Payment already processed"));
    }
    Ok(ApiResponse::failure("Payment cancelled"))
}

#[utoipa::path(
    get,
    path = "/api/payments/history",
    responses(
        (status = 200, description = "Caller's transactions", body = Vec<TransactionHistoryRow>),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    security(
        ("cookie" = [])
    ),
    tag = "payments"
)]
async fn history_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user()?;
    let history = TransactionHistoryRow::for_student(state.pool(), user.user_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Transaction::get_resource_type(), e))?;

    Ok(ApiResponse::ok(history))
}
