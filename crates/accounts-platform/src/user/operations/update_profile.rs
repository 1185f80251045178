//! Update Profile Use Case

use std::sync::Arc;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::shared::authorization_service::{checks, AuthorizationService};
use crate::usecase::{ExecutionContext, UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::{Gender, User};
use crate::user::repository::UserRepository;
use super::rejected;

/// Command for updating profile fields. Unset fields are left alone;
/// a blank name counts as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileCommand {
    pub login: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
}

pub struct UpdateProfileUseCase {
    authz: AuthorizationService,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl UpdateProfileUseCase {
    pub fn new(user_repo: Arc<dyn UserRepository>, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self {
            authz: AuthorizationService::new(user_repo),
            unit_of_work,
        }
    }

    pub async fn execute(
        &self,
        command: UpdateProfileCommand,
        ctx: ExecutionContext,
    ) -> UseCaseResult<User> {
        let target = match self.prepare(&command, &ctx).await {
            Ok(target) => target,
            Err(e) => return rejected("update_profile", &ctx, e),
        };

        let result = self.unit_of_work.commit(UserChange::Update(target)).await;
        if result.is_success() {
            info!(login = %command.login, actor = %ctx.principal_id, "Profile updated");
        }
        result
    }

    async fn prepare(&self, command: &UpdateProfileCommand, ctx: &ExecutionContext) -> Result<User, UseCaseError> {
        let actor = self.authz.resolve_actor(&ctx.principal_id).await?;
        let mut target = self.authz.resolve_target(&command.login).await?;
        checks::require_admin_or_self_active(&actor, &target)?;

        let gender = command
            .gender
            .map(Gender::try_from)
            .transpose()
            .map_err(|message| UseCaseError::validation("INVALID_GENDER", message))?;

        target.update_profile(
            command.name.as_deref(),
            gender,
            command.birthday,
            &actor.login,
            ctx.initiated_at,
        );
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::*;

    #[tokio::test]
    async fn test_partial_update() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = UpdateProfileUseCase::new(store.clone(), store.clone());
        let birthday = NaiveDate::from_ymd_opt(1990, 1, 15).unwrap();

        let user = use_case
            .execute(
                UpdateProfileCommand {
                    login: "bob".to_string(),
                    name: Some("Robert".to_string()),
                    birthday: Some(birthday),
                    ..Default::default()
                },
                ctx("bob"),
            )
            .await
            .unwrap();

        assert_eq!(user.name, "Robert");
        assert_eq!(user.gender, Gender::Male);
        assert_eq!(user.birthday, Some(birthday));
    }

    #[tokio::test]
    async fn test_empty_update_only_stamps() {
        let store = seeded_store().await;
        let before = add_user(&store, "bob").await;
        let use_case = UpdateProfileUseCase::new(store.clone(), store.clone());

        let after = use_case
            .execute(
                UpdateProfileCommand { login: "bob".to_string(), ..Default::default() },
                ctx(ADMIN),
            )
            .await
            .unwrap();

        assert_eq!(after.name, before.name);
        assert_eq!(after.gender, before.gender);
        assert_eq!(after.modified_by.as_deref(), Some(ADMIN));
        assert!(after.modified_on.is_some());
    }

    #[tokio::test]
    async fn test_invalid_gender_rejected() {
        let store = seeded_store().await;
        add_user(&store, "bob").await;
        let use_case = UpdateProfileUseCase::new(store.clone(), store.clone());

        let err = use_case
            .execute(
                UpdateProfileCommand { login: "bob".to_string(), gender: Some(5), ..Default::default() },
                ctx("bob"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_GENDER");
    }
}
