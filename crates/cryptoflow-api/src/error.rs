//! Unified API error response type.
//!
//! Every endpoint returns the same error shape:
//!
//! ```json
//! {"code": "NOT_FOUND", "message": "Asset 42 not found"}
//! ```

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code (e.g. "DB_ERROR", "NOT_FOUND", "INVALID_INPUT")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Optional extra detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// Handler result alias.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// Map a data-layer failure to a 500 response.
pub fn db_error(e: impl std::fmt::Display) -> (StatusCode, Json<ApiErrorResponse>) {
    tracing::error!(error = %e, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiErrorResponse::new("DB_ERROR", e.to_string())),
    )
}

/// 404 with a resource description.
pub fn not_found(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiErrorResponse::new("NOT_FOUND", message)),
    )
}

/// 400 with a validation message.
pub fn invalid_input(message: impl Into<String>) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::new("INVALID_INPUT", message)),
    )
}

/// 400 for an out-of-range query parameter, with the accepted range in
/// the details payload.
pub fn out_of_range(field: &str, min: i64, max: i64) -> (StatusCode, Json<ApiErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiErrorResponse::with_details(
            "INVALID_INPUT",
            format!("{} must be between {} and {}", field, min, max),
            serde_json::json!({ "field": field, "min": min, "max": max }),
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_without_empty_details() {
        let error = ApiErrorResponse::new("NOT_FOUND", "Asset 42 not found");
        let json = serde_json::to_string(&error).unwrap();
        assert!(!json.contains("details"));
        assert!(json.contains(r#""code":"NOT_FOUND""#));
    }

    #[test]
    fn out_of_range_carries_the_accepted_bounds() {
        let (status, body) = out_of_range("hours", 1, 720);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "INVALID_INPUT");
        let details = body.0.details.unwrap();
        assert_eq!(details["field"], "hours");
        assert_eq!(details["min"], 1);
        assert_eq!(details["max"], 720);
    }

    #[test]
    fn details_round_trip() {
        let error = ApiErrorResponse::with_details(
            "INVALID_INPUT",
            "bad window",
            serde_json::json!({"window": 17}),
        );
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["details"]["window"], 17);
    }
}
