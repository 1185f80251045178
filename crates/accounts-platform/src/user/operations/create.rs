//! Create User Use Case

use std::sync::Arc;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::authorization_service::AuthorizationService;
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::{Gender, User};
use crate::user::repository::UserRepository;
use crate::user::validation::validate_create_user;
use super::rejected;

/// Command for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserCommand {
    /// Latin letters and digits only
    #[serde(default)]
    pub login: String,

    /// 8 to 32 characters with upper, lower and digit
    #[serde(default, skip_serializing)]
    pub password: String,

    #[serde(default)]
    pub name: String,

    /// 0 female, 1 male, 2 unknown
    #[serde(default)]
    pub gender: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,

    #[serde(default)]
    pub admin: bool,
}

/// Any existing user may create users, admins included.
pub struct CreateUserUseCase {
    user_repo: Arc<dyn UserRepository>,
    authz: AuthorizationService,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl CreateUserUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo.clone()),
            user_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: CreateUserCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let user = match self.prepare(&command, &ctx).await {
            Ok(user) => user,
            Err(e) => return rejected("create_user", &ctx, e),
        };

        // Uniqueness is checked again inside the commit.
        let result = self.unit_of_work.commit(UserChange::Insert(user)).await;
        if let UseCaseResult::Success(user) = &result {
            info!(login = %user.login, admin = user.admin, actor = %ctx.principal_id, "User created");
        }
        result
    }

    async fn prepare(&self, command: &CreateUserCommand, ctx: &ExecutionContext) -> Result<User, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;

        let violations = validate_create_user(command);
        if !violations.is_empty() {
            return Err(UseCaseError::validation_with_details(
                "INVALID_USER",
                format!("{} field(s) failed validation", violations.len()),
                crate::details! { "violations" => violations },
            ));
        }

        let existing = self.user_repo
            .find_by_login(&command.login)
            .await
            .map_err(|e| UseCaseError::commit(format!("Failed to look up user: {}", e)))?;
        if existing.is_some() {
            return Err(UseCaseError::login_taken(&command.login));
        }

        let gender = command.gender
            .ok_or_else(|| "Gender is required".to_string())
            .and_then(Gender::try_from)
            .map_err(|message| UseCaseError::validation("INVALID_GENDER", message))?;

        Ok(User::new(
            command.login.clone(),
            command.password.clone(),
            command.name.clone(),
            gender,
            command.birthday,
            command.admin,
            actor.login,
        )
        .with_created_on(ctx.initiated_at))
    }
}
