//! User Operations
//!
//! One use case per operation. Mutations finish through `UnitOfWork::commit`;
//! queries read the repository directly.

pub mod authenticate;
pub mod create;
pub mod change_login;
pub mod change_password;
pub mod update_profile;
pub mod delete;
pub mod restore;
pub mod get_by_login;
pub mod get_all_active;
pub mod get_older_than;

use std::sync::Arc;

pub use authenticate::{AuthenticateCommand, AuthenticateUseCase};
pub use create::{CreateUserCommand, CreateUserUseCase};
pub use change_login::{ChangeLoginCommand, ChangeLoginUseCase};
pub use change_password::{ChangePasswordCommand, ChangePasswordUseCase};
pub use update_profile::{UpdateProfileCommand, UpdateProfileUseCase};
pub use delete::{DeleteUserCommand, DeleteUserUseCase};
pub use restore::{RestoreUserCommand, RestoreUserUseCase};
pub use get_by_login::{GetUserByLoginQuery, GetUserByLoginUseCase};
pub use get_all_active::GetAllActiveUseCase;
pub use get_older_than::{birthday_cutoff, GetUsersOlderThanQuery, GetUsersOlderThanUseCase};

use crate::usecase::UnitOfWork;
use crate::user::repository::UserRepository;

/// Every user use case wired over one repository and unit of work.
pub struct UserOperations {
    pub authenticate: AuthenticateUseCase,
    pub create: CreateUserUseCase,
    pub change_login: ChangeLoginUseCase,
    pub change_password: ChangePasswordUseCase,
    pub update_profile: UpdateProfileUseCase,
    pub delete: DeleteUserUseCase,
    pub restore: RestoreUserUseCase,
    pub get_by_login: GetUserByLoginUseCase,
    pub get_all_active: GetAllActiveUseCase,
    pub get_older_than: GetUsersOlderThanUseCase,
}

impl UserOperations {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authenticate: AuthenticateUseCase::new(user_repo.clone()),
            create: CreateUserUseCase::new(user_repo.clone(), unit_of_work.clone()),
            change_login: ChangeLoginUseCase::new(user_repo.clone(), unit_of_work.clone()),
            change_password: ChangePasswordUseCase::new(user_repo.clone(), unit_of_work.clone()),
            update_profile: UpdateProfileUseCase::new(user_repo.clone(), unit_of_work.clone()),
            delete: DeleteUserUseCase::new(user_repo.clone(), unit_of_work.clone()),
            restore: RestoreUserUseCase::new(user_repo.clone(), unit_of_work),
            get_by_login: GetUserByLoginUseCase::new(user_repo.clone()),
            get_all_active: GetAllActiveUseCase::new(user_repo.clone()),
            get_older_than: GetUsersOlderThanUseCase::new(user_repo),
        }
    }
}

use tracing::debug;

use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};

/// Log a rejected operation and turn it into a failure.
pub(crate) fn rejected<T>(
    operation: &'static str,
    ctx: &ExecutionContext,
    error: UseCaseError,
) -> UseCaseResult<T> {
    debug!(
        operation,
        actor = %ctx.principal_id,
        correlation_id = %ctx.correlation_id,
        code = error.code(),
        "Operation rejected: {}",
        error.message()
    );
    UseCaseResult::failure(error)
}
