//! Restore User Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

/// Command for undoing a soft delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreUserCommand {
    pub login: String,
}

pub struct RestoreUserUseCase {
    authz: AuthorizationService,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl RestoreUserUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo),
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: RestoreUserCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let target = match self.prepare(&command, &ctx).await {
            Ok(target) => target,
            Err(e) => return rejected("restore_user", &ctx, e),
        };

        let result = self.unit_of_work.commit(UserChange::Update(target)).await;
        if result.is_success() {
            info!(login = %command.login, actor = %ctx.principal_id, "User restored");
        }
        result
    }

    async fn prepare(&self, command: &RestoreUserCommand, ctx: &ExecutionContext) -> Result<User, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;
        checks::require_admin(&actor)?;

        let mut target = self.authz.resolve_target(&command.login).await?;
        if target.is_active() {
            return Err(UseCaseError::business_rule_with_details(
                "NOT_REVOKED",
                format!("User '{}' is not deleted", command.login),
                crate::details! { "login" => command.login },
            ));
        }

        target.reinstate(&actor.login, ctx.initiated_at);
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;

    fn command(login: &str) -> RestoreUserCommand {
        RestoreUserCommand { login: login.to_string() }
    }

    #[tokio::test]
    async fn test_restore_revoked_user() {
        let store = seeded_store().await;
        let mut bob = add_user(&store, "bob").await;
        let original_id = bob.id.clone();
        bob.revoke(ADMIN, chrono::Utc::now());
        store.commit(UserChange::Update(bob)).await.unwrap();
        let use_case = RestoreUserUseCase::new(store.clone(), store.clone());

        let bob = use_case.execute(command("bob"), ctx(ADMIN)).await.unwrap();
        assert!(bob.is_active());
        assert!(bob.revoked_by.is_none());
        assert_eq!(bob.id, original_id);
        assert_eq!(bob.modified_by.as_deref(), Some(ADMIN));
    }

    #[tokio::test]
    async fn test_restore_active_user_rejected() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let commits = store.commit_count();
        let use_case = RestoreUserUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("bob"), ctx(ADMIN)).await.unwrap_err();
        assert_eq!(err.code(), "NOT_REVOKED");
        assert_eq!(store.commit_count(), commits);
    }

    #[tokio::test]
    async fn test_non_admin_rejected() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = RestoreUserUseCase::new(store.clone(), store.clone());

        let err = use_case.execute(command("bob"), ctx("bob")).await.unwrap_err();
        assert_eq!(err.code(), "NOT_ADMIN");
    }
}
