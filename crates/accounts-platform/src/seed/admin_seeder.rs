//! Administrator Seeder
//!
//! Ensures the well-known administrator exists on startup. Seeding is
//! idempotent: an existing record with the seed login is left untouched,
//! whether it is active, revoked or no longer an admin.
//!
//! Default credentials:
//!   Admin / Admin123

use std::sync::Arc;
use tracing::{info, warn};

use crate::shared::error::{PlatformError, Result};
use crate::usecase::execution_context::SYSTEM_PRINCIPAL;
use crate::usecase::{UnitOfWork, UseCaseResult, UserChange};
use crate::user::entity::{Gender, User};
use crate::user::repository::UserRepository;

/// Credentials of the seeded administrator.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub login: String,
    pub password: String,
    pub name: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            login: "Admin".to_string(),
            password: "Admin123".to_string(),
            name: "Administrator".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

pub struct AdminSeeder {
    user_repo: Arc<dyn UserRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    seed: AdminSeed,
}

impl AdminSeeder {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        unit_of_work: Arc<dyn UnitOfWork>,
        seed: AdminSeed,
    ) -> Self {
        Self { user_repo, unit_of_work, seed }
    }

    pub async fn seed(&self) -> Result<SeedOutcome> {
        if self.user_repo.find_by_login(&self.seed.login).await?.is_some() {
            info!(login = %self.seed.login, "Administrator already present, skipping seed");
            return Ok(SeedOutcome::AlreadyPresent);
        }

        let admin = User::new(
            &self.seed.login,
            &self.seed.password,
            &self.seed.name,
            Gender::Unknown,
            None,
            true,
            SYSTEM_PRINCIPAL,
        );

        match self.unit_of_work.commit(UserChange::Insert(admin)).await {
            UseCaseResult::Success(user) => {
                info!(login = %user.login, id = %user.id, "Seeded administrator");
            }
            // Another instance seeded first.
            UseCaseResult::Failure(e) if e.code() == "LOGIN_TAKEN" => {
                warn!(login = %self.seed.login, "Administrator inserted concurrently");
                return Ok(SeedOutcome::AlreadyPresent);
            }
            UseCaseResult::Failure(e) => {
                return Err(PlatformError::internal(format!("Failed to seed administrator: {}", e.message())));
            }
        }

        let admins = self.user_repo.count_admins().await?;
        info!(admins, "Administrator seeding complete");
        Ok(SeedOutcome::Created)
    }
}
