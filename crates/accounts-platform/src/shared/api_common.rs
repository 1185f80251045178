//! Common API types and utilities

use utoipa::ToSchema;
use serde::Serialize;

/// Standard API error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Success response with optional message
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_message_serialization() {
        let json = serde_json::to_value(SuccessResponse::with_message("User bob created")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "User bob created");

        let json = serde_json::to_value(SuccessResponse::ok()).unwrap();
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_api_error_omits_empty_details() {
        let json = serde_json::to_value(ApiError::new("NOT_ADMIN", "no")).unwrap();
        assert_eq!(json["error"], "NOT_ADMIN");
        assert!(json.get("details").is_none());
    }
}
