//! API Middleware
//!
//! Request extractors that identify the caller. The acting user is named by
//! the `X-Current-User` header; there is no token or session authentication.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::shared::error::PlatformError;
use crate::usecase::ExecutionContext;
use crate::usecase::execution_context::ANONYMOUS_PRINCIPAL;

pub const CURRENT_USER_HEADER: &str = "x-current-user";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Correlation ID from `X-Correlation-ID`, if the caller sent one.
pub struct Correlation(pub Option<String>);

impl Correlation {
    pub fn execution_context(&self, principal: &str) -> ExecutionContext {
        match &self.0 {
            Some(id) => ExecutionContext::with_correlation(principal, id.clone()),
            None => ExecutionContext::create(principal),
        }
    }

    pub fn anonymous_context(&self) -> ExecutionContext {
        self.execution_context(ANONYMOUS_PRINCIPAL)
    }
}

impl<S> FromRequestParts<S> for Correlation
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Correlation(header_value(&parts.headers, CORRELATION_ID_HEADER)))
    }
}

/// The acting user named by `X-Current-User`.
///
/// A missing or blank header rejects the request with 400 before any use case
/// runs. Whether the login exists is decided by the use case.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub login: String,
    pub correlation_id: Option<String>,
}

impl CurrentUser {
    pub fn execution_context(&self) -> ExecutionContext {
        Correlation(self.correlation_id.clone()).execution_context(&self.login)
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let login = header_value(&parts.headers, CURRENT_USER_HEADER)
            .ok_or_else(|| PlatformError::validation("X-Current-User header is required"))?;

        Ok(CurrentUser {
            login,
            correlation_id: header_value(&parts.headers, CORRELATION_ID_HEADER),
        })
    }
}
