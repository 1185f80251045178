//! Execution Context
//!
//! Carries correlation IDs and the acting login through a use case execution.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Principal recorded on records written by startup seeding.
pub const SYSTEM_PRINCIPAL: &str = "System";

/// Principal used for requests that carry no actor (authenticate).
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Context for a use case execution.
///
/// `principal_id` is the login of the acting user, taken verbatim from the
/// `X-Current-User` header; use cases resolve it against storage themselves.
/// `initiated_at` is the single timestamp every stamp of the execution uses.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique ID for this execution (generated)
    pub execution_id: String,
    /// ID for distributed tracing (usually from the request)
    pub correlation_id: String,
    /// Login of the acting user
    pub principal_id: String,
    /// When the execution was initiated
    pub initiated_at: DateTime<Utc>,
}

impl ExecutionContext {
    /// Create a context for a fresh request with no upstream correlation.
    pub fn create(principal_id: impl Into<String>) -> Self {
        let exec_id = new_execution_id();
        Self {
            correlation_id: exec_id.clone(),
            execution_id: exec_id,
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Create a context that continues an upstream correlation ID.
    pub fn with_correlation(
        principal_id: impl Into<String>,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            execution_id: new_execution_id(),
            correlation_id: correlation_id.into(),
            principal_id: principal_id.into(),
            initiated_at: Utc::now(),
        }
    }

    /// Context for work the service performs on its own behalf.
    pub fn system() -> Self {
        Self::create(SYSTEM_PRINCIPAL)
    }

    /// Same execution, different acting principal.
    pub fn with_principal(&self, principal_id: impl Into<String>) -> Self {
        Self {
            execution_id: self.execution_id.clone(),
            correlation_id: self.correlation_id.clone(),
            principal_id: principal_id.into(),
            initiated_at: self.initiated_at,
        }
    }
}

fn new_execution_id() -> String {
    format!("exec-{}", Uuid::new_v4().simple())
}
