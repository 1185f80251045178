//! User Entity
//!
//! The single record type managed by the service.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use uuid::Uuid;

/// Gender, stored and exchanged as its integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Gender {
    Female = 0,
    Male = 1,
    #[default]
    Unknown = 2,
}

impl Gender {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<Gender> for i32 {
    fn from(gender: Gender) -> Self {
        gender.code()
    }
}

impl TryFrom<i32> for Gender {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Unknown),
            other => Err(format!("Invalid gender code {}, expected 0, 1 or 2", other)),
        }
    }
}

/// User account record.
///
/// A record is active while `revoked_on` is unset. The creation stamp is
/// written once by `User::new`; every later mutation goes through a method
/// that also stamps `modified_on` / `modified_by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// UUID v7
    #[serde(rename = "_id")]
    pub id: String,

    /// Unique across all records, revoked ones included
    pub login: String,

    /// Stored as given; never exposed by the API
    pub password: String,

    pub name: String,

    pub gender: Gender,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub birthday: Option<NaiveDate>,

    pub admin: bool,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,

    pub created_by: String,

    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub modified_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub modified_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default, with = "bson::serde_helpers::chrono_datetime_as_bson_datetime_optional")]
    pub revoked_on: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub revoked_by: Option<String>,

    /// Bumped by every committed update. A change built from an older
    /// version is rejected at commit.
    #[serde(default)]
    pub version: u64,
}

impl User {
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
        gender: Gender,
        birthday: Option<NaiveDate>,
        admin: bool,
        created_by: impl Into<String>,
    ) -> Self {
        Self {
            // Time-ordered, so ids follow creation order.
            id: Uuid::now_v7().to_string(),
            login: login.into(),
            password: password.into(),
            name: name.into(),
            gender,
            birthday,
            admin,
            created_on: Utc::now(),
            created_by: created_by.into(),
            modified_on: None,
            modified_by: None,
            revoked_on: None,
            revoked_by: None,
            version: 0,
        }
    }

    pub fn with_created_on(mut self, created_on: DateTime<Utc>) -> Self {
        self.created_on = created_on;
        self
    }

    pub fn is_active(&self) -> bool {
        self.revoked_on.is_none()
    }

    pub fn is_revoked(&self) -> bool {
        !self.is_active()
    }

    /// Exact, case-sensitive comparison.
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    fn touch(&mut self, by: &str, at: DateTime<Utc>) {
        self.modified_on = Some(at);
        self.modified_by = Some(by.to_string());
    }

    pub fn rename(&mut self, new_login: impl Into<String>, by: &str, at: DateTime<Utc>) {
        self.login = new_login.into();
        self.touch(by, at);
    }

    pub fn set_password(&mut self, password: impl Into<String>, by: &str, at: DateTime<Utc>) {
        self.password = password.into();
        self.touch(by, at);
    }

    /// Apply the provided profile fields. A blank name is ignored.
    /// The modification stamp moves even when nothing else changes.
    pub fn update_profile(
        &mut self,
        name: Option<&str>,
        gender: Option<Gender>,
        birthday: Option<NaiveDate>,
        by: &str,
        at: DateTime<Utc>,
    ) {
        if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
            self.name = name.to_string();
        }
        if let Some(gender) = gender {
            self.gender = gender;
        }
        if let Some(birthday) = birthday {
            self.birthday = Some(birthday);
        }
        self.touch(by, at);
    }

    /// Soft delete. Sets both revocation fields; the modification stamp is untouched.
    pub fn revoke(&mut self, by: &str, at: DateTime<Utc>) {
        self.revoked_on = Some(at);
        self.revoked_by = Some(by.to_string());
    }

    /// Undo a soft delete, clearing both revocation fields.
    pub fn reinstate(&mut self, by: &str, at: DateTime<Utc>) {
        self.revoked_on = None;
        self.revoked_by = None;
        self.touch(by, at);
    }

    /// Born on or before `cutoff`. Records without a birthday never match.
    pub fn born_on_or_before(&self, cutoff: NaiveDate) -> bool {
        self.birthday.is_some_and(|b| b <= cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> User {
        User::new("bob", "Password123", "Bob", Gender::Male, None, false, "Admin")
    }

    #[test]
    fn test_new_user_is_active_and_unmodified() {
        let user = bob();
        assert!(user.is_active());
        assert_eq!(user.created_by, "Admin");
        assert!(user.modified_on.is_none());
        assert!(user.modified_by.is_none());
        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.version, 0);
    }

    #[test]
    fn test_ids_follow_creation_order() {
        let ids: Vec<String> = (0..200).map(|_| bob().id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_revoke_and_reinstate_move_pair_together() {
        let mut user = bob();
        let at = Utc::now();

        user.revoke("Admin", at);
        assert_eq!(user.revoked_on, Some(at));
        assert_eq!(user.revoked_by.as_deref(), Some("Admin"));
        assert!(user.modified_on.is_none());

        user.reinstate("Admin", at);
        assert!(user.revoked_on.is_none());
        assert!(user.revoked_by.is_none());
        assert_eq!(user.modified_by.as_deref(), Some("Admin"));
    }

    #[test]
    fn test_update_profile_ignores_blank_name() {
        let mut user = bob();
        let birthday = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();

        user.update_profile(Some("  "), Some(Gender::Unknown), Some(birthday), "bob", Utc::now());

        assert_eq!(user.name, "Bob");
        assert_eq!(user.gender, Gender::Unknown);
        assert_eq!(user.birthday, Some(birthday));
        assert_eq!(user.modified_by.as_deref(), Some("bob"));
    }

    #[test]
    fn test_update_profile_with_nothing_only_stamps() {
        let mut user = bob();
        let before = user.clone();

        user.update_profile(None, None, None, "bob", Utc::now());

        assert_eq!(user.name, before.name);
        assert_eq!(user.gender, before.gender);
        assert_eq!(user.birthday, before.birthday);
        assert!(user.modified_on.is_some());
    }

    #[test]
    fn test_password_match_is_exact() {
        let user = bob();
        assert!(user.password_matches("Password123"));
        assert!(!user.password_matches("password123"));
        assert!(!user.password_matches("Password123 "));
    }

    #[test]
    fn test_born_on_or_before() {
        let mut user = bob();
        let cutoff = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert!(!user.born_on_or_before(cutoff));

        user.birthday = Some(cutoff);
        assert!(user.born_on_or_before(cutoff));

        user.birthday = cutoff.succ_opt();
        assert!(!user.born_on_or_before(cutoff));
    }

    #[test]
    fn test_gender_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "0");
        assert_eq!(serde_json::from_str::<Gender>("1").unwrap(), Gender::Male);
        assert!(serde_json::from_str::<Gender>("3").is_err());
    }

    #[test]
    fn test_bson_round_trip_keeps_optional_fields() {
        let mut user = bob();
        user.revoke("Admin", Utc::now());

        let doc = bson::to_document(&user).unwrap();
        assert!(doc.contains_key("_id"));
        assert!(doc.contains_key("revokedOn"));
        assert!(!doc.contains_key("modifiedOn"));

        let back: User = bson::from_document(doc).unwrap();
        assert_eq!(back.login, "bob");
        assert!(back.is_revoked());
    }
}
