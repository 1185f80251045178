//! Use Case Errors
//!
//! Categorized error types for use case failures. The category decides the
//! natural HTTP status; the user API may collapse it further.
//!
//! ```ignore
//! UseCaseError::validation("INVALID_LOGIN", "Login must be alphanumeric");
//!
//! UseCaseError::business_rule_with_details(
//!     "LOGIN_TAKEN",
//!     "Login is already in use",
//!     details!{ "login" => login },
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Macro for creating error detail maps.
///
/// ```ignore
/// let details = details! {
///     "login" => "bob",
///     "age" => 30
/// };
/// ```
#[macro_export]
macro_rules! details {
    () => {
        std::collections::HashMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(
            map.insert($key.to_string(), serde_json::json!($value));
        )+
        map
    }};
}

/// Categorized error types for use case failures.
///
/// Natural HTTP status per variant:
/// - `ValidationError` -> 400 Bad Request
/// - `InvalidCredentials` -> 401 Unauthorized
/// - `AuthorizationError` -> 403 Forbidden
/// - `NotFoundError` -> 404 Not Found
/// - `BusinessRuleViolation` -> 409 Conflict
/// - `CommitError` -> 500 Internal Server Error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UseCaseError {
    /// Malformed input (create payload, new login).
    ValidationError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Actor lacks the admin flag or the self-active permission.
    AuthorizationError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Record state conflicts with the request (login taken, not revoked, self-delete).
    BusinessRuleViolation {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Actor or target record absent.
    NotFoundError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },

    /// Login/password pair rejected. Carries no hint about which part failed.
    InvalidCredentials {
        code: String,
        message: String,
    },

    /// Storage failed while committing or reading.
    CommitError {
        code: String,
        message: String,
        #[serde(default)]
        details: HashMap<String, serde_json::Value>,
    },
}

impl UseCaseError {
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn validation_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::ValidationError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn authorization(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthorizationError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn business_rule(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn business_rule_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::BusinessRuleViolation {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    pub fn not_found_with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self::NotFoundError {
            code: code.into(),
            message: message.into(),
            details,
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::InvalidCredentials {
            code: "INVALID_CREDENTIALS".to_string(),
            message: "Invalid login or password".to_string(),
        }
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::CommitError {
            code: "COMMIT_FAILED".to_string(),
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// The login already belongs to another record.
    pub fn login_taken(login: &str) -> Self {
        Self::business_rule_with_details(
            "LOGIN_TAKEN",
            format!("Login '{}' is already in use", login),
            crate::details! { "login" => login },
        )
    }

    /// The record changed between the read and the commit.
    pub fn stale_record(login: &str) -> Self {
        Self::business_rule_with_details(
            "CONCURRENT_MODIFICATION",
            format!("User '{}' was modified concurrently, retry the operation", login),
            crate::details! { "login" => login },
        )
    }

    pub fn code(&self) -> &str {
        match self {
            Self::ValidationError { code, .. } => code,
            Self::AuthorizationError { code, .. } => code,
            Self::BusinessRuleViolation { code, .. } => code,
            Self::NotFoundError { code, .. } => code,
            Self::InvalidCredentials { code, .. } => code,
            Self::CommitError { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::ValidationError { message, .. } => message,
            Self::AuthorizationError { message, .. } => message,
            Self::BusinessRuleViolation { message, .. } => message,
            Self::NotFoundError { message, .. } => message,
            Self::InvalidCredentials { message, .. } => message,
            Self::CommitError { message, .. } => message,
        }
    }

    /// Structured details, empty for variants that carry none.
    pub fn details(&self) -> Option<&HashMap<String, serde_json::Value>> {
        match self {
            Self::ValidationError { details, .. }
            | Self::AuthorizationError { details, .. }
            | Self::BusinessRuleViolation { details, .. }
            | Self::NotFoundError { details, .. }
            | Self::CommitError { details, .. } => Some(details).filter(|d| !d.is_empty()),
            Self::InvalidCredentials { .. } => None,
        }
    }

    /// Get the suggested HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::ValidationError { .. } => 400,
            Self::InvalidCredentials { .. } => 401,
            Self::AuthorizationError { .. } => 403,
            Self::NotFoundError { .. } => 404,
            Self::BusinessRuleViolation { .. } => 409,
            Self::CommitError { .. } => 500,
        }
    }
}

impl std::fmt::Display for UseCaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for UseCaseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_category() {
        assert_eq!(UseCaseError::validation("INVALID_USER", "bad").http_status_code(), 400);
        assert_eq!(UseCaseError::invalid_credentials().http_status_code(), 401);
        assert_eq!(UseCaseError::authorization("NOT_ADMIN", "no").http_status_code(), 403);
        assert_eq!(UseCaseError::not_found("USER_NOT_FOUND", "gone").http_status_code(), 404);
        assert_eq!(UseCaseError::business_rule("NOT_REVOKED", "active").http_status_code(), 409);
        assert_eq!(UseCaseError::commit("disk").http_status_code(), 500);
    }

    #[test]
    fn test_login_taken_carries_login() {
        let err = UseCaseError::login_taken("bob");
        assert_eq!(err.code(), "LOGIN_TAKEN");
        assert_eq!(
            err.details().and_then(|d| d.get("login")),
            Some(&serde_json::json!("bob"))
        );
    }

    #[test]
    fn test_details_empty_is_none() {
        let err = UseCaseError::authorization("NOT_PERMITTED", "no");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_details_macro_multiple() {
        let details: HashMap<String, serde_json::Value> = details! {
            "login" => "bob",
            "age" => 42,
        };
        assert_eq!(details.get("login"), Some(&serde_json::json!("bob")));
        assert_eq!(details.get("age"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn test_serializes_with_type_tag() {
        let err = UseCaseError::not_found("ACTOR_NOT_FOUND", "missing");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "NotFoundError");
        assert_eq!(json["code"], "ACTOR_NOT_FOUND");
    }
}
