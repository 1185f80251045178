//! Shared Module
//!
//! Cross-cutting concerns: errors, request extractors, indexes and health.

pub mod error;
pub mod middleware;
pub mod api_common;
pub mod indexes;

// APIs
pub mod health_api;

// Services
pub mod authorization_service;

pub use error::{PlatformError, Result};
pub use middleware::{Correlation, CurrentUser};
pub use api_common::{ApiError, SuccessResponse};
pub use health_api::{health_router, HealthState};
pub use authorization_service::AuthorizationService;
