//! User Repository
//!
//! Read side of the user store. Writes go through `UnitOfWork`.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::{doc, Document}};

use crate::shared::error::Result;
use crate::user::entity::User;

pub const USERS_COLLECTION: &str = "users";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Records with no revocation, oldest `createdOn` first.
    async fn find_active_ordered_by_created(&self) -> Result<Vec<User>>;

    /// Records (revoked included) whose birthday is on or before `cutoff`.
    async fn find_born_on_or_before(&self, cutoff: NaiveDate) -> Result<Vec<User>>;

    async fn count_admins(&self) -> Result<u64>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(USERS_COLLECTION),
        }
    }
}

/// `createdOn` keeps millisecond precision only. Ids are UUID v7, so `_id`
/// breaks ties in creation order.
fn active_order() -> Document {
    doc! { "createdOn": 1, "_id": 1 }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "login": login }).await?)
    }

    async fn find_active_ordered_by_created(&self) -> Result<Vec<User>> {
        let cursor = self.collection
            .find(doc! { "revokedOn": null })
            .sort(active_order())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_born_on_or_before(&self, cutoff: NaiveDate) -> Result<Vec<User>> {
        // Birthdays are stored as ISO `YYYY-MM-DD` strings, which order like dates.
        let cursor = self.collection
            .find(doc! { "birthday": { "$lte": cutoff.format("%Y-%m-%d").to_string() } })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_admins(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "admin": true }).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_order_breaks_ties_by_id() {
        let keys: Vec<_> = active_order().keys().cloned().collect();
        assert_eq!(keys, vec!["createdOn", "_id"]);
    }
}
