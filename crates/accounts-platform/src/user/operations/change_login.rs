//! Change Login Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use crate::user::validation::validate_login;
use super::rejected;

/// Command for renaming a user's login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLoginCommand {
    /// Current login of the target
    pub login: String,
    pub new_login: String,
}

pub struct ChangeLoginUseCase {
    user_repo: Arc<dyn UserRepository>,
    authz: AuthorizationService,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl ChangeLoginUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo.clone()),
            user_repo,
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ChangeLoginCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let target = match self.prepare(&command, &ctx).await {
            Ok(target) => target,
            Err(e) => return rejected("change_login", &ctx, e),
        };

        let result = self.unit_of_work.commit(UserChange::Update(target)).await;
        if result.is_success() {
            info!(
                from = %command.login,
                to = %command.new_login,
                actor = %ctx.principal_id,
                "Login changed"
            );
        }
        result
    }

    async fn prepare(&self, command: &ChangeLoginCommand, ctx: &ExecutionContext) -> Result<User, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;
        let mut target = self.authz.resolve_target(&command.login).await?;
        checks::require_admin_or_self_active(&actor, &target)?;

        if let Some(violation) = validate_login(&command.new_login) {
            return Err(UseCaseError::validation_with_details(
                "INVALID_LOGIN",
                violation.message.clone(),
                crate::details! { "violation" => violation },
            ));
        }

        // Renaming to the current login counts as taken.
        let owner = self.user_repo
            .find_by_login(&command.new_login)
            .await
            .map_err(|e| UseCaseError::commit(format!("Failed to look up user: {}", e)))?;
        if owner.is_some() {
            return Err(UseCaseError::login_taken(&command.new_login));
        }

        target.rename(command.new_login.clone(), &actor.login, ctx.initiated_at);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;

    fn command(login: &str, new_login: &str) -> ChangeLoginCommand {
        ChangeLoginCommand {
            login: login.to_string(),
            new_login: new_login.to_string(),
        }
    }

    #[tokio::test]
    async fn test_self_rename() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = ChangeLoginUseCase::new(store.clone(), store.clone());

        let user = use_case.execute(command("bob", "robert"), ctx("bob")).await.unwrap();
        assert_eq!(user.login, "robert");
        assert_eq!(user.modified_by.as_deref(), Some("bob"));
        assert!(store.find_by_login("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rename_to_taken_login() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        add_user(&store, "alice").await;
        let commits = store.commit_count();
        let use_case = ChangeLoginUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("bob", "alice"), ctx(ADMIN)).await.unwrap_err();
        assert_eq!(err.code(), "LOGIN_TAKEN");
        let err = use_case.execute(command("bob", "bob"), ctx(ADMIN)).await.unwrap_err();
        assert_eq!(err.code(), "LOGIN_TAKEN");
        assert_eq!(store.commit_count(), commits);
    }

    #[tokio::test]
    async fn test_other_user_cannot_rename() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        add_user(&store, "alice").await;
        let use_case = ChangeLoginUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("bob", "bobby"), ctx("alice")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_PERMITTED");
    }

    #[tokio::test]
    async fn test_malformed_new_login() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = ChangeLoginUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("bob", "bob smith"), ctx("bob")).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_LOGIN");
    }
}
