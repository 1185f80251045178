//! Delete User Use Case

use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

/// Command for deleting a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserCommand {
    pub login: String,

    /// Remove the record instead of revoking it
    #[serde(default)]
    pub hard: bool,
}

/// Admin-only. An admin cannot delete themselves.
///
/// Soft delete revokes the record and keeps its login reserved; revoking an
/// already revoked record moves the revocation stamp.
pub struct DeleteUserUseCase {
    authz: AuthorizationService,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl DeleteUserUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo),
            unit_of_work,
        }
    }

    /// Returns the removed record (hard) or the revoked record (soft).
    pub async fn execute(
        &self,
        command: DeleteUserCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let change = match self.prepare(&command, &ctx).await {
            Ok(change) => change,
            Err(e) => return rejected("delete_user", &ctx, e),
        };

        let result = self.unit_of_work.commit(change).await;
        if result.is_success() {
            info!(
                login = %command.login,
                hard = command.hard,
                actor = %ctx.principal_id,
                "User deleted"
            );
        }
        result
    }

    async fn prepare(&self, command: &DeleteUserCommand, ctx: &ExecutionContext) -> Result<UserChange, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;
        checks::require_admin(&actor)?;

        if actor.login == command.login {
            return Err(UseCaseError::business_rule(
                "CANNOT_DELETE_SELF",
                "Administrators cannot delete their own account",
            ));
        }

        let mut target = self.authz.resolve_target(&command.login).await?;

        if command.hard {
            Ok(UserChange::Delete(target))
        } else {
            target.revoke(&actor.login, ctx.initiated_at);
            Ok(UserChange::Update(target))
        }
    }
}
