//! In-memory user store.
//!
//! Implements both `UserRepository` and `UnitOfWork` over one
//! insertion-ordered map. Every commit runs under the write lock, which makes
//! the version check, the login uniqueness check and the write a single
//! atomic step.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::shared::error::Result;
use crate::usecase::{UnitOfWork, UseCaseError, UseCaseResult, UserChange};
use crate::user::entity::User;
use crate::user::repository::UserRepository;

#[derive(Default)]
pub struct InMemoryUserStore {
    /// Keyed by record id, in insertion order
    users: RwLock<IndexMap<String, User>>,
    commits: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `commit` calls received, successful or not.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Snapshot of every record, revoked included, in insertion order.
    pub fn snapshot(&self) -> Vec<User> {
        self.users.read().values().cloned().collect()
    }

    fn login_owner<'a>(users: &'a IndexMap<String, User>, login: &str) -> Option<&'a User> {
        users.values().find(|u| u.login == login)
    }

    /// Apply `change` and return the record as committed.
    ///
    /// Updates and deletes must carry the stored version; a newer stored
    /// version means another commit landed after this change was read.
    fn apply(users: &mut IndexMap<String, User>, change: &UserChange) -> std::result::Result<User, UseCaseError> {
        let user = change.user();
        match change {
            UserChange::Insert(_) => {
                if Self::login_owner(users, &user.login).is_some() || users.contains_key(&user.id) {
                    return Err(UseCaseError::login_taken(&user.login));
                }
                users.insert(user.id.clone(), user.clone());
                Ok(user.clone())
            }
            UserChange::Update(_) => {
                Self::check_version(users, user)?;
                if Self::login_owner(users, &user.login).is_some_and(|owner| owner.id != user.id) {
                    return Err(UseCaseError::login_taken(&user.login));
                }
                let mut next = user.clone();
                next.version += 1;
                // Existing key: position in the map is preserved.
                users.insert(next.id.clone(), next.clone());
                Ok(next)
            }
            UserChange::Delete(_) => {
                Self::check_version(users, user)?;
                users.shift_remove(&user.id);
                Ok(user.clone())
            }
        }
    }

    fn check_version(users: &IndexMap<String, User>, user: &User) -> std::result::Result<(), UseCaseError> {
        match users.get(&user.id) {
            None => Err(missing(user)),
            Some(stored) if stored.version != user.version => {
                Err(UseCaseError::stale_record(&stored.login))
            }
            Some(_) => Ok(()),
        }
    }
}

fn missing(user: &User) -> UseCaseError {
    UseCaseError::not_found_with_details(
        "USER_NOT_FOUND",
        format!("User '{}' no longer exists", user.login),
        crate::details! { "id" => user.id },
    )
}

#[async_trait]
impl UserRepository for InMemoryUserStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let users = self.users.read();
        Ok(Self::login_owner(&users, login).cloned())
    }

    async fn find_active_ordered_by_created(&self) -> Result<Vec<User>> {
        let mut active: Vec<User> = self.users
            .read()
            .values()
            .filter(|u| u.is_active())
            .cloned()
            .collect();
        // Stable sort: insertion order breaks ties.
        active.sort_by_key(|u| u.created_on);
        Ok(active)
    }

    async fn find_born_on_or_before(&self, cutoff: NaiveDate) -> Result<Vec<User>> {
        Ok(self.users
            .read()
            .values()
            .filter(|u| u.born_on_or_before(cutoff))
            .cloned()
            .collect())
    }

    async fn count_admins(&self) -> Result<u64> {
        Ok(self.users.read().values().filter(|u| u.admin).count() as u64)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUserStore {
    async fn commit(&self, change: UserChange) -> UseCaseResult<User> {
        self.commits.fetch_add(1, Ordering::SeqCst);

        let mut users = self.users.write();
        let committed = match Self::apply(&mut users, &change) {
            Ok(user) => user,
            Err(e) => return UseCaseResult::failure(e),
        };
        drop(users);

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::entity::Gender;
    use chrono::{Duration, Utc};

    fn user(login: &str) -> User {
        User::new(login, "Password123", login, Gender::Unknown, None, false, "Admin")
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_login() {
        let store = InMemoryUserStore::new();
        assert!(store.commit(UserChange::Insert(user("bob"))).await.is_success());

        let err = store.commit(UserChange::Insert(user("bob"))).await.unwrap_err();
        assert_eq!(err.code(), "LOGIN_TAKEN");
        assert_eq!(store.len(), 1);
        assert_eq!(store.commit_count(), 2);
    }

    #[tokio::test]
    async fn test_update_rejects_login_of_other_record() {
        let store = InMemoryUserStore::new();
        store.commit(UserChange::Insert(user("bob"))).await.unwrap();
        let mut alice = store.commit(UserChange::Insert(user("alice"))).await.unwrap();

        alice.login = "bob".to_string();
        let err = store.commit(UserChange::Update(alice)).await.unwrap_err();
        assert_eq!(err.code(), "LOGIN_TAKEN");
        assert!(store.find_by_login("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_keeps_position_and_allows_same_login() {
        let store = InMemoryUserStore::new();
        let mut bob = store.commit(UserChange::Insert(user("bob"))).await.unwrap();
        store.commit(UserChange::Insert(user("alice"))).await.unwrap();

        bob.name = "Robert".to_string();
        store.commit(UserChange::Update(bob)).await.unwrap();

        let logins: Vec<_> = store.snapshot().into_iter().map(|u| u.login).collect();
        assert_eq!(logins, vec!["bob", "alice"]);
    }

    #[tokio::test]
    async fn test_update_bumps_version() {
        let store = InMemoryUserStore::new();
        let bob = store.commit(UserChange::Insert(user("bob"))).await.unwrap();
        assert_eq!(bob.version, 0);

        let bob = store.commit(UserChange::Update(bob)).await.unwrap();
        assert_eq!(bob.version, 1);
        assert_eq!(store.find_by_login("bob").await.unwrap().unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_stale_update_rejected() {
        let store = InMemoryUserStore::new();
        let read_by_first = store.commit(UserChange::Insert(user("bob"))).await.unwrap();
        let mut read_by_second = read_by_first.clone();

        let mut revoked = read_by_first;
        revoked.revoke("Admin", Utc::now());
        store.commit(UserChange::Update(revoked)).await.unwrap();

        read_by_second.password = "Changed123".to_string();
        let err = store.commit(UserChange::Update(read_by_second)).await.unwrap_err();
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");

        let stored = store.find_by_login("bob").await.unwrap().unwrap();
        assert!(stored.is_revoked());
        assert!(stored.password_matches("Password123"));
    }

    #[tokio::test]
    async fn test_stale_delete_rejected() {
        let store = InMemoryUserStore::new();
        let bob = store.commit(UserChange::Insert(user("bob"))).await.unwrap();
        store.commit(UserChange::Update(bob.clone())).await.unwrap();

        let err = store.commit(UserChange::Delete(bob)).await.unwrap_err();
        assert_eq!(err.code(), "CONCURRENT_MODIFICATION");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = InMemoryUserStore::new();
        let err = store.commit(UserChange::Delete(user("ghost"))).await.unwrap_err();
        assert_eq!(err.code(), "USER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_active_scan_ordered_by_created() {
        let store = InMemoryUserStore::new();
        let now = Utc::now();
        store.commit(UserChange::Insert(user("late").with_created_on(now))).await.unwrap();
        store
            .commit(UserChange::Insert(user("early").with_created_on(now - Duration::hours(1))))
            .await
            .unwrap();
        let mut gone = user("gone").with_created_on(now - Duration::hours(2));
        gone.revoke("Admin", now);
        store.commit(UserChange::Insert(gone)).await.unwrap();

        let logins: Vec<_> = store
            .find_active_ordered_by_created()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        assert_eq!(logins, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_birthday_scan_includes_revoked() {
        let store = InMemoryUserStore::new();
        let cutoff = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();

        let mut old = user("old");
        old.birthday = NaiveDate::from_ymd_opt(1980, 3, 3);
        old.revoke("Admin", Utc::now());
        let mut young = user("young");
        young.birthday = NaiveDate::from_ymd_opt(2010, 3, 3);

        store.commit(UserChange::Insert(old)).await.unwrap();
        store.commit(UserChange::Insert(young)).await.unwrap();
        store.commit(UserChange::Insert(user("nobirthday"))).await.unwrap();

        let found = store.find_born_on_or_before(cutoff).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].login, "old");
    }
}
