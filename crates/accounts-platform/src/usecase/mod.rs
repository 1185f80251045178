//! Use Case Infrastructure
//!
//! Provides the foundational patterns for implementing use cases:
//! - `UseCaseResult<T>` - sealed result type for use case outcomes
//! - `UseCaseError` - categorized error types for consistent handling
//! - `ExecutionContext` - correlation and actor context for an execution
//! - `UnitOfWork` - atomic commit of a single user record change

pub mod result;
pub mod error;
pub mod execution_context;
pub mod unit_of_work;

pub use result::UseCaseResult;
pub use error::UseCaseError;
pub use execution_context::ExecutionContext;
pub use unit_of_work::{UnitOfWork, MongoUnitOfWork, UserChange};
