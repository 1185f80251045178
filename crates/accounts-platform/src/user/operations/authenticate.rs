//! Authenticate Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

/// Credentials check. The password is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateCommand {
    pub login: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Succeeds iff an active record with this login has exactly this password.
pub struct AuthenticateUseCase {
    user_repo: Arc<dyn UserRepository>,
}

impl AuthenticateUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn execute(
        &self,
        command: AuthenticateCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let user = match self.user_repo.find_by_login(&command.login).await {
            Ok(user) => user,
            Err(e) => {
                return rejected(
                    "authenticate",
                    &ctx,
                    UseCaseError::commit(format!("Failed to look up user: {}", e)),
                );
            }
        };

        match user {
            Some(user) if user.is_active() && user.password_matches(&command.password) => {
                UseCaseResult::success(user)
            }
            _ => rejected("authenticate", &ctx, UseCaseError::invalid_credentials()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;
    use crate::usecase::{UnitOfWork, UserChange};

    fn command(login: &str, password: &str) -> AuthenticateCommand {
        AuthenticateCommand {
            login: login.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_authenticate_active_user() {
        let store = seeded_store().await;
        let use_case = AuthenticateUseCase::new(store.clone());

        let user = use_case.execute(command("Admin", "Admin123"), ctx("anonymous")).await.unwrap();
        assert_eq!(user.login, "Admin");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_login_look_alike() {
        let store = seeded_store().await;
        let use_case = AuthenticateUseCase::new(store.clone());

        let wrong = use_case.execute(command("Admin", "admin123"), ctx("anonymous")).await.unwrap_err();
        let unknown = use_case.execute(command("ghost", "Admin123"), ctx("anonymous")).await.unwrap_err();
        assert_eq!(wrong.code(), "INVALID_CREDENTIALS");
        assert_eq!(wrong.message(), unknown.message());
    }

    #[tokio::test]
    async fn test_revoked_user_cannot_authenticate() {
        let store = seeded_store().await;
        let mut bob = add_user(&store, "bob").await;
        bob.revoke("Admin", chrono::Utc::now());
        store.commit(UserChange::Update(bob)).await.unwrap();

        let use_case = AuthenticateUseCase::new(store.clone());
        let result = use_case.execute(command("bob", "Password123"), ctx("anonymous")).await;
        assert!(result.is_failure());
    }

    #[test]
    fn test_password_not_serialized() {
        let json = serde_json::to_string(&command("bob", "Secret123")).unwrap();
        assert!(!json.contains("Secret123"));
    }
}
