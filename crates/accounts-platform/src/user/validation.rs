//! Input validation for user payloads.

use regex::Regex;
use serde::Serialize;

use crate::user::entity::Gender;
use crate::user::operations::CreateUserCommand;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 32;

fn login_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9]+$").expect("login pattern is a valid regex")
    })
}

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, code: &'static str, message: impl Into<String>) -> Self {
        Self { field, code, message: message.into() }
    }
}

pub fn validate_login(login: &str) -> Option<Violation> {
    if login.is_empty() {
        return Some(Violation::new("login", "REQUIRED", "Login is required"));
    }
    if !login_pattern().is_match(login) {
        return Some(Violation::new(
            "login",
            "NOT_ALPHANUMERIC",
            "Login may contain only Latin letters and digits",
        ));
    }
    None
}

pub fn validate_password(password: &str) -> Option<Violation> {
    if password.is_empty() {
        return Some(Violation::new("password", "REQUIRED", "Password is required"));
    }
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Some(Violation::new(
            "password",
            "LENGTH",
            format!(
                "Password must be {} to {} characters long",
                PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
            ),
        ));
    }
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Some(Violation::new(
            "password",
            "COMPLEXITY",
            "Password needs an uppercase letter, a lowercase letter and a digit",
        ));
    }
    None
}

pub fn validate_name(name: &str) -> Option<Violation> {
    if name.trim().is_empty() {
        return Some(Violation::new("name", "REQUIRED", "Name is required"));
    }
    None
}

pub fn validate_gender(code: Option<i32>) -> Option<Violation> {
    match code {
        None => Some(Violation::new("gender", "REQUIRED", "Gender is required")),
        Some(code) => Gender::try_from(code)
            .err()
            .map(|message| Violation::new("gender", "OUT_OF_RANGE", message)),
    }
}

/// Every rule is checked; all violations are reported together.
pub fn validate_create_user(command: &CreateUserCommand) -> Vec<Violation> {
    [
        validate_login(&command.login),
        validate_password(&command.password),
        validate_name(&command.name),
        validate_gender(command.gender),
    ]
    .into_iter()
    .flatten()
    .collect()
}
