//! Get All Active Users Use Case

use std::sync::Arc;
use tracing::debug;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

/// Active records ordered by creation time.
///
/// A caller who is not an admin (or does not exist) gets an empty list,
/// never an error. Storage failures are still reported.
pub struct GetAllActiveUseCase {
    user_repo: Arc<dyn UserRepository>,
    authz: AuthorizationService,
}

impl GetAllActiveUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo.clone()),
            user_repo,
        }
    }

    pub async fn execute(&self, ctx: ExecutionContext) -> UseCaseResult<Vec<User>> {
        let actor = match self.authz.resolve_actor(&ctx.principal_id).await {
            Ok(actor) => Some(actor),
            Err(e @ UseCaseError::CommitError { .. }) => return rejected("get_all_active", &ctx, e),
            Err(_) => None,
        };
        if !actor.as_ref().is_some_and(checks::is_admin) {
            debug!(actor = %ctx.principal_id, "Listing denied, returning empty set");
            return UseCaseResult::success(Vec::new());
        }

        match self.user_repo.find_active_ordered_by_created().await {
            Ok(users) => UseCaseResult::success(users),
            Err(e) => rejected(
                "get_all_active",
                &ctx,
                UseCaseError::commit(format!("Failed to list users: {}", e)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;
    use crate::usecase::{UnitOfWork, UserChange};

    #[tokio::test]
    async fn test_admin_sees_active_in_creation_order() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let mut carol = add_user(&store, "carol").await;
        add_user(&store, "dave").await;
        carol.revoke(ADMIN, chrono::Utc::now());
        store.commit(UserChange::Update(carol)).await.unwrap();

        let use_case = GetAllActiveUseCase::new(store.clone());
        let logins: Vec<_> = use_case
            .execute(ctx(ADMIN))
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["Admin", "bob", "dave"]);
    }

    #[tokio::test]
    async fn test_non_admin_and_unknown_get_empty() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = GetAllActiveUseCase::new(store.clone());

        assert!(use_case.execute(ctx("bob")).await.unwrap().is_empty());
        assert!(use_case.execute(ctx("ghost")).await.unwrap().is_empty());
    }
}
