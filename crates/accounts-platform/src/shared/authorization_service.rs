//! Authorization Service
//!
//! Admin / self-active permission model. The actor is always a stored user
//! record, resolved from the login carried by the execution context.

use std::sync::Arc;
use tracing::error;

use crate::usecase::UseCaseError;
use crate::user::entity::User;
use crate::user::repository::UserRepository;

/// Resolves actors and targets against the user store.
#[derive(Clone)]
pub struct AuthorizationService {
    user_repo: Arc<dyn UserRepository>,
}

impl AuthorizationService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Look up the acting user. Revoked actors still resolve; the gates decide.
    pub async fn resolve_actor(&self, login: &str) -> Result<User, UseCaseError> {
        match self.lookup(login).await? {
            Some(actor) => Ok(actor),
            None => Err(UseCaseError::not_found_with_details(
                "ACTOR_NOT_FOUND",
                format!("Current user '{}' does not exist", login),
                crate::details! { "login" => login },
            )),
        }
    }

    pub async fn resolve_target(&self, login: &str) -> Result<User, UseCaseError> {
        match self.lookup(login).await? {
            Some(target) => Ok(target),
            None => Err(UseCaseError::not_found_with_details(
                "USER_NOT_FOUND",
                format!("User '{}' not found", login),
                crate::details! { "login" => login },
            )),
        }
    }

    async fn lookup(&self, login: &str) -> Result<Option<User>, UseCaseError> {
        self.user_repo.find_by_login(login).await.map_err(|e| {
            error!(login, "User lookup failed: {}", e);
            UseCaseError::commit(format!("Failed to look up user: {}", e))
        })
    }
}

/// Permission predicates and gates.
pub mod checks {
    use super::*;

    pub fn is_admin(actor: &User) -> bool {
        actor.admin
    }

    /// Actor is the target and the target is not revoked.
    pub fn is_self_active(actor: &User, target: &User) -> bool {
        actor.login == target.login && target.is_active()
    }

    pub fn require_admin(actor: &User) -> Result<(), UseCaseError> {
        if is_admin(actor) {
            Ok(())
        } else {
            Err(UseCaseError::authorization(
                "NOT_ADMIN",
                "Only administrators may perform this operation",
            ))
        }
    }

    /// Gate for single-target mutations.
    pub fn require_admin_or_self_active(actor: &User, target: &User) -> Result<(), UseCaseError> {
        if is_admin(actor) || is_self_active(actor, target) {
            Ok(())
        } else {
            Err(UseCaseError::authorization(
                "NOT_PERMITTED",
                format!("'{}' may not modify '{}'", actor.login, target.login),
            ))
        }
    }
}
