use axum::{Json, response::IntoResponse};
use serde::Serialize;

pub mod admin;
pub mod assessments;
pub mod auth;
pub mod courses;
pub mod discussions;
pub mod payments;
pub mod reviews;
pub mod xapi;

/// Success envelope: `{success: true, message?, data?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message<S: Into<String>>(message: S, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message<S: Into<String>>(message: S) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Envelope for a handled but unsuccessful outcome, e.g. a cancelled payment.
    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn envelope_skips_absent_parts() {
        let body = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "done"}));

        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "data": [1, 2]}));

        let body = serde_json::to_value(ApiResponse::failure("cancelled")).unwrap();
        assert_eq!(body["success"], false);
    }
}
