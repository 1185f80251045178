//! Change Password Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

/// Command for replacing a user's password.
///
/// No strength policy applies here; only creation validates passwords.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordCommand {
    pub login: String,
    #[serde(skip_serializing)]
    pub new_password: String,
}

pub struct ChangePasswordUseCase {
    authz: AuthorizationService,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl ChangePasswordUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo),
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: ChangePasswordCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let target = match self.prepare(&command, &ctx).await {
            Ok(target) => target,
            Err(e) => return rejected("change_password", &ctx, e),
        };

        let result = self.unit_of_work.commit(UserChange::Update(target)).await;
        if result.is_success() {
            info!(login = %command.login, actor = %ctx.principal_id, "Password changed");
        }
        result
    }

    async fn prepare(&self, command: &ChangePasswordCommand, ctx: &ExecutionContext) -> Result<User, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;
        let mut target = self.authz.resolve_target(&command.login).await?;
        checks::require_admin_or_self_active(&actor, &target)?;

        target.set_password(command.new_password.clone(), &actor.login, ctx.initiated_at);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;
    use crate::user::repository::UserRepository;

    fn command(login: &str, new_password: &str) -> ChangePasswordCommand {
        ChangePasswordCommand {
            login: login.to_string(),
            new_password: new_password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_self_change() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = ChangePasswordUseCase::new(store.clone(), store.clone());

        use_case.execute(command("bob", "NewPass123"), ctx("bob")).await.unwrap();

        let bob = store.find_by_login("bob").await.unwrap().unwrap();
        assert!(bob.password_matches("NewPass123"));
        assert_eq!(bob.modified_by.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_admin_changes_revoked_user() {
        let store = seeded_store().await;
        let mut bob = add_user(&store, "bob").await;
        bob.revoke(ADMIN, chrono::Utc::now());
        store.commit(UserChange::Update(bob)).await.unwrap();
        let use_case = ChangePasswordUseCase::new(store.clone(), store.clone());

        assert!(use_case.execute(command("bob", "x"), ctx(ADMIN)).await.is_success());
    }

    #[tokio::test]
    async fn test_revoked_self_rejected() {
        let store = seeded_store().await;
        let mut bob = add_user(&store, "bob").await;
        bob.revoke(ADMIN, chrono::Utc::now());
        store.commit(UserChange::Update(bob)).await.unwrap();
        let commits = store.commit_count();
        let use_case = ChangePasswordUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("bob", "NewPass123"), ctx("bob")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_PERMITTED");
        assert_eq!(store.commit_count(), commits);
    }

    #[tokio::test]
    async fn test_missing_target() {
        let store = seeded_store().await;
        let use_case = ChangePasswordUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("ghost", "NewPass123"), ctx(ADMIN)).await.unwrap_err();
        assert_eq!(err.code(), "USER_NOT_FOUND");
    }
}
