//! Use Case Result Type
//!
//! A sealed result type for use case execution. Mutating use cases can only
//! succeed through the UnitOfWork, so every successful change is committed.

use super::error::UseCaseError;

/// Result type for use case execution.
///
/// Works like `Result<T, E>`, except that `Success` cannot be built outside
/// this crate: mutations reach it through `UnitOfWork::commit()`, queries
/// through the crate-private constructor.
///
/// ```ignore
/// if !is_admin(&actor) {
///     return UseCaseResult::failure(UseCaseError::authorization("NOT_ADMIN", "..."));
/// }
///
/// target.revoke(&ctx.principal_id, ctx.initiated_at);
/// self.unit_of_work.commit(UserChange::Update(target)).await
/// ```
pub enum UseCaseResult<T> {
    Success(T),
    Failure(UseCaseError),
}

impl<T> UseCaseResult<T> {
    /// Create a failure result. Any code may reject.
    pub fn failure(error: UseCaseError) -> Self {
        UseCaseResult::Failure(error)
    }

    pub(crate) fn success(value: T) -> Self {
        UseCaseResult::Success(value)
    }

    /// Boolean view of the outcome, as exposed by the HTTP boundary.
    pub fn is_success(&self) -> bool {
        matches!(self, UseCaseResult::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, UseCaseResult::Failure(_))
    }

    /// Get the success value, consuming self.
    ///
    /// Panics on failure; intended for tests.
    pub fn unwrap(self) -> T {
        match self {
            UseCaseResult::Success(v) => v,
            UseCaseResult::Failure(e) => panic!("Called unwrap on a Failure: {}", e),
        }
    }

    /// Get the error, consuming self. Panics on success.
    pub fn unwrap_err(self) -> UseCaseError {
        match self {
            UseCaseResult::Success(_) => panic!("Called unwrap_err on a Success"),
            UseCaseResult::Failure(e) => e,
        }
    }

    pub fn unwrap_or_else<F>(self, f: F) -> T
    where
        F: FnOnce(UseCaseError) -> T,
    {
        match self {
            UseCaseResult::Success(v) => v,
            UseCaseResult::Failure(e) => f(e),
        }
    }

    /// The success value, discarding any error.
    pub fn ok(self) -> Option<T> {
        match self {
            UseCaseResult::Success(v) => Some(v),
            UseCaseResult::Failure(_) => None,
        }
    }

    /// The error, if any, without consuming self.
    pub fn error(&self) -> Option<&UseCaseError> {
        match self {
            UseCaseResult::Success(_) => None,
            UseCaseResult::Failure(e) => Some(e),
        }
    }

    pub fn map<U, F>(self, f: F) -> UseCaseResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            UseCaseResult::Success(v) => UseCaseResult::Success(f(v)),
            UseCaseResult::Failure(e) => UseCaseResult::Failure(e),
        }
    }

    pub fn into_result(self) -> Result<T, UseCaseError> {
        match self {
            UseCaseResult::Success(v) => Ok(v),
            UseCaseResult::Failure(e) => Err(e),
        }
    }
}

impl<T> From<UseCaseResult<T>> for Result<T, UseCaseError> {
    fn from(result: UseCaseResult<T>) -> Self {
        result.into_result()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for UseCaseResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UseCaseResult::Success(v) => f.debug_tuple("Success").field(v).finish(),
            UseCaseResult::Failure(e) => f.debug_tuple("Failure").field(e).finish(),
        }
    }
}
