//! Accounts Platform
//!
//! User account management:
//! - `user` - entity, validation, storage providers, operations and REST API
//! - `usecase` - sealed results, categorized errors, unit of work
//! - `shared` - errors, request extractors, authorization, indexes, health
//! - `seed` - startup administrator seeding
//!
//! Every mutation goes through a use case that checks the acting user's
//! permissions and finishes with a single `UnitOfWork::commit`.

pub mod user;
pub mod usecase;
pub mod shared;
pub mod seed;

use std::sync::Arc;
use utoipa_axum::router::OpenApiRouter;

pub use shared::error::{PlatformError, Result};
pub use shared::indexes::initialize_indexes;
pub use shared::health_api::{health_router, HealthState};

pub use usecase::{
    UseCaseResult, UseCaseError, ExecutionContext, UnitOfWork, MongoUnitOfWork, UserChange,
};

pub use user::{
    Gender, User, UserRepository, MongoUserRepository, InMemoryUserStore,
    UserOperations, UserView, UsersState,
};
pub use seed::{AdminSeed, AdminSeeder, SeedOutcome};

/// Base path of the users API.
pub const USERS_BASE_PATH: &str = "/api/users";

/// Users API mounted under `/api/users`, with its OpenAPI description.
pub fn api_router(operations: Arc<UserOperations>) -> OpenApiRouter {
    OpenApiRouter::new()
        .nest(USERS_BASE_PATH, user::users_router(UsersState::new(operations)))
}
