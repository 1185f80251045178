//! Get Users Older Than Use Case

use std::sync::Arc;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UseCaseError, UseCaseResult};
use crate::user::entity::User;
use crate::user::repository::UserRepository;
use super::rejected;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetUsersOlderThanQuery {
    /// Age in whole years; negative ages are rejected by the HTTP layer
    pub age: u32,
}

/// Latest birthday that still makes someone `age` years old on `today`.
///
/// A Feb 29 that does not exist in the target year clamps to Feb 28.
/// `None` when the date would fall before the representable range.
pub fn birthday_cutoff(today: NaiveDate, age: u32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(age.checked_mul(12)?))
}

/// Records (revoked included) with a birthday on or before the cutoff.
/// Non-admin callers get an empty list.
pub struct GetUsersOlderThanUseCase {
    user_repo: Arc<dyn UserRepository>,
    authz: AuthorizationService,
}

impl GetUsersOlderThanUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo.clone()),
            user_repo,
        }
    }

    pub async fn execute(
        &self,
        query: GetUsersOlderThanQuery,
        ctx: ExecutionContext,
    ) -> UseCaseResult<Vec<User>> {
        let actor = match self.authz.resolve_actor(&ctx.principal_id).await {
            Ok(actor) => Some(actor),
            Err(e @ UseCaseError::CommitError { .. }) => return rejected("get_older_than", &ctx, e),
            Err(_) => None,
        };
        if !actor.as_ref().is_some_and(checks::is_admin) {
            debug!(actor = %ctx.principal_id, "Age query denied, returning empty set");
            return UseCaseResult::success(Vec::new());
        }

        let Some(cutoff) = birthday_cutoff(ctx.initiated_at.date_naive(), query.age) else {
            return UseCaseResult::success(Vec::new());
        };

        match self.user_repo.find_born_on_or_before(cutoff).await {
            Ok(users) => UseCaseResult::success(users),
            Err(e) => rejected(
                "get_older_than",
                &ctx,
                UseCaseError::commit(format!("Failed to query users: {}", e)),
            ),
        }
    }
}
