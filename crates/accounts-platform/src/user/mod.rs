//! User Aggregate
//!
//! The user account entity, its validation rules, storage and REST API.

pub mod entity;
pub mod validation;
pub mod repository;
pub mod memory;
pub mod operations;
pub mod api;

pub use entity::{Gender, User};
pub use repository::{MongoUserRepository, UserRepository, USERS_COLLECTION};
pub use memory::InMemoryUserStore;
pub use operations::UserOperations;
pub use api::{users_router, UserView, UsersState};
