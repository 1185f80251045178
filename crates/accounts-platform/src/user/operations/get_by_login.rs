//! Get User By Login Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUserByLoginQuery {
    pub login: String,
}

/// Admin-only lookup; revoked records are returned too.
pub struct GetUserByLoginUseCase {
    authz: AuthorizationService,
}

impl GetUserByLoginUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo),
        }
    }

    pub async fn execute(&self, query: GetUserByLoginQuery, ctx: ExecutionContext) -> UseCaseResult<User> {
        match self.find(&query, &ctx).await {
            Ok(user) => UseCaseResult::success(user),
            Err(e) => rejected("get_user_by_login", &ctx, e),
        }
    }

    async fn find(&self, query: &GetUserByLoginQuery, ctx: &ExecutionContext) -> Result<User, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;
        checks::require_admin(&actor)?;
        self.authz.resolve_target(&query.login).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;

    fn query(login: &str) -> GetUserByLoginQuery {
        GetUserByLoginQuery { login: login.to_string() }
    }

    #[tokio::test]
    async fn test_admin_gets_user() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = GetUserByLoginUseCase::new(store.clone());

        assert_eq!(use_case.execute(query("bob"), ctx(ADMIN)).await.unwrap().login, "bob");
        assert_eq!(
            use_case.execute(query("ghost"), ctx(ADMIN)).await.unwrap_err().code(),
            "USER_NOT_FOUND"
        );
    }

    #[tokio::test]
    async fn test_non_admin_cannot_read_even_self() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = GetUserByLoginUseCase::new(store.clone());

        assert!(use_case.execute(query("bob"), ctx("bob")).await.is_failure());
    }
}
