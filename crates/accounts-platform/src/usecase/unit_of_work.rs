//! Unit of Work
//!
//! Atomic commit of a single user record change. Login uniqueness is
//! re-checked inside the commit, so two racing writers cannot both succeed.

use async_trait::async_trait;
use mongodb::{
    Client, ClientSession, Collection, Database,
    bson::{doc, Document},
    error::{ErrorKind, WriteFailure},
};
use tracing::{debug, error};

use super::error::UseCaseError;
use super::result::UseCaseResult;
use crate::user::entity::User;

/// Duplicate key error code reported by MongoDB.
const DUPLICATE_KEY: i32 = 11000;

/// A single change to the user store.
///
/// Soft delete and restore are `Update`s of a record whose revocation
/// fields were moved together by `User::revoke` / `User::reinstate`.
#[derive(Debug, Clone)]
pub enum UserChange {
    Insert(User),
    Update(User),
    Delete(User),
}

impl UserChange {
    pub fn user(&self) -> &User {
        match self {
            UserChange::Insert(u) | UserChange::Update(u) | UserChange::Delete(u) => u,
        }
    }

    pub fn into_user(self) -> User {
        match self {
            UserChange::Insert(u) | UserChange::Update(u) | UserChange::Delete(u) => u,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            UserChange::Insert(_) => "insert",
            UserChange::Update(_) => "update",
            UserChange::Delete(_) => "delete",
        }
    }
}

/// Unit of Work for user record mutations.
///
/// **This is the ONLY way for a mutating use case to return success.**
/// `UseCaseResult::success()` is crate-private and use cases end with:
///
/// ```ignore
/// target.rename(&cmd.new_login, &ctx.principal_id, ctx.initiated_at);
/// self.unit_of_work.commit(UserChange::Update(target)).await
/// ```
///
/// On success the committed record is returned (for `Delete`, the removed one);
/// an update comes back with its `version` bumped.
/// Implementations fail with `LOGIN_TAKEN` when an insert or update would
/// give two records the same login, with `USER_NOT_FOUND` when an update or
/// delete targets a record that no longer exists, and with
/// `CONCURRENT_MODIFICATION` when the stored version is newer than the
/// change's.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn commit(&self, change: UserChange) -> UseCaseResult<User>;
}

/// MongoDB implementation of UnitOfWork using multi-document transactions.
///
/// # Requirements:
/// - MongoDB 4.0+ replica set (transactions)
/// - Unique index on `users.login` (see `shared::indexes`)
#[derive(Clone)]
pub struct MongoUnitOfWork {
    client: Client,
    collection: Collection<User>,
}

impl MongoUnitOfWork {
    pub fn new(client: Client, database: Database) -> Self {
        Self {
            client,
            collection: database.collection(crate::user::repository::USERS_COLLECTION),
        }
    }

    async fn apply(&self, change: &UserChange, session: &mut ClientSession) -> Result<User, UseCaseError> {
        let user = change.user();
        match change {
            UserChange::Insert(_) => {
                self.collection
                    .insert_one(user)
                    .session(&mut *session)
                    .await
                    .map_err(|e| map_write_error(e, user))?;
                Ok(user.clone())
            }
            UserChange::Update(_) => {
                let mut next = user.clone();
                next.version += 1;
                let result = self.collection
                    .replace_one(version_filter(user), &next)
                    .session(&mut *session)
                    .await
                    .map_err(|e| map_write_error(e, user))?;
                if result.matched_count == 0 {
                    return Err(self.explain_miss(user, session).await);
                }
                Ok(next)
            }
            UserChange::Delete(_) => {
                let result = self.collection
                    .delete_one(version_filter(user))
                    .session(&mut *session)
                    .await
                    .map_err(|e| map_write_error(e, user))?;
                if result.deleted_count == 0 {
                    return Err(self.explain_miss(user, session).await);
                }
                Ok(user.clone())
            }
        }
    }

    /// A versioned write matched nothing: the record is gone or newer.
    async fn explain_miss(&self, user: &User, session: &mut ClientSession) -> UseCaseError {
        match self.collection
            .find_one(doc! { "_id": &user.id })
            .session(&mut *session)
            .await
        {
            Ok(Some(stored)) => UseCaseError::stale_record(&stored.login),
            Ok(None) => user_gone(user),
            Err(e) => UseCaseError::commit(format!("Failed to read user: {}", e)),
        }
    }
}

/// Matches the record only at the version the change was built from.
/// Records written before versioning have no field and count as version 0.
fn version_filter(user: &User) -> Document {
    let version = user.version as i64;
    if version == 0 {
        doc! { "_id": &user.id, "$or": [ { "version": 0_i64 }, { "version": null } ] }
    } else {
        doc! { "_id": &user.id, "version": version }
    }
}

#[async_trait]
impl UnitOfWork for MongoUnitOfWork {
    async fn commit(&self, change: UserChange) -> UseCaseResult<User> {
        let mut session = match self.client.start_session().await {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to start MongoDB session: {}", e);
                return UseCaseResult::failure(UseCaseError::commit(
                    format!("Failed to start session: {}", e)
                ));
            }
        };

        if let Err(e) = session.start_transaction().await {
            error!("Failed to start transaction: {}", e);
            return UseCaseResult::failure(UseCaseError::commit(
                format!("Failed to start transaction: {}", e)
            ));
        }

        let committed = match self.apply(&change, &mut session).await {
            Ok(user) => user,
            Err(e) => {
                let _ = session.abort_transaction().await;
                return UseCaseResult::failure(e);
            }
        };

        if let Err(e) = session.commit_transaction().await {
            error!("Failed to commit transaction: {}", e);
            return UseCaseResult::failure(UseCaseError::commit(
                format!("Failed to commit transaction: {}", e)
            ));
        }

        debug!(
            user_id = %committed.id,
            login = %committed.login,
            version = committed.version,
            change = change.kind(),
            "Committed user change"
        );

        UseCaseResult::success(committed)
    }
}

fn user_gone(user: &User) -> UseCaseError {
    UseCaseError::not_found_with_details(
        "USER_NOT_FOUND",
        format!("User '{}' no longer exists", user.login),
        crate::details! { "id" => user.id },
    )
}

fn map_write_error(err: mongodb::error::Error, user: &User) -> UseCaseError {
    if is_duplicate_key(&err) {
        return UseCaseError::login_taken(&user.login);
    }
    error!(login = %user.login, "Failed to write user: {}", err);
    UseCaseError::commit(format!("Failed to write user: {}", err))
}

pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
