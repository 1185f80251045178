//! Users API
//!
//! REST endpoints for user accounts. The acting user is named by the
//! `X-Current-User` header. Rule failures are collapsed to the status each
//! endpoint reports (400, 401 or 404); the body still carries the error code.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::shared::api_common::{ApiError, SuccessResponse};
use crate::shared::error::PlatformError;
use crate::shared::middleware::{Correlation, CurrentUser};
use crate::usecase::UseCaseResult;
use crate::user::entity::User;
use crate::user::operations::{
    AuthenticateCommand, ChangeLoginCommand, ChangePasswordCommand, CreateUserCommand,
    DeleteUserCommand, GetUserByLoginQuery, GetUsersOlderThanQuery, RestoreUserCommand,
    UpdateProfileCommand, UserOperations,
};

/// User as returned by the API. The password never leaves the service.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub login: String,
    pub name: String,
    /// 0 female, 1 male, 2 unknown
    pub gender: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    pub admin: bool,
    /// False once the user is revoked
    pub active: bool,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_on: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            active: u.is_active(),
            gender: u.gender.code(),
            id: u.id,
            login: u.login,
            name: u.name,
            birthday: u.birthday,
            admin: u.admin,
            created_on: u.created_on,
            created_by: u.created_by,
            modified_on: u.modified_on,
            modified_by: u.modified_by,
            revoked_on: u.revoked_on,
            revoked_by: u.revoked_by,
        }
    }
}

/// Create user request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Latin letters and digits only
    #[serde(default)]
    pub login: String,

    /// 8 to 32 characters with an uppercase letter, a lowercase letter and a digit
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub name: String,

    /// 0 female, 1 male, 2 unknown
    #[serde(default)]
    pub gender: Option<i32>,

    #[serde(default)]
    pub birthday: Option<NaiveDate>,

    #[serde(default)]
    pub admin: bool,
}

impl From<CreateUserRequest> for CreateUserCommand {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            login: req.login,
            password: req.password,
            name: req.name,
            gender: req.gender,
            birthday: req.birthday,
            admin: req.admin,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileParams {
    pub new_name: Option<String>,
    pub new_gender: Option<i32>,
    pub new_birthday: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordParams {
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLoginParams {
    pub new_login: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub hard: bool,
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateParams {
    pub login: String,
    pub password: String,
}

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub operations: Arc<UserOperations>,
}

impl UsersState {
    pub fn new(operations: Arc<UserOperations>) -> Self {
        Self { operations }
    }
}

/// Collapse a boolean operation's outcome to 200 or 400.
fn acknowledge<T>(result: UseCaseResult<T>, message: impl FnOnce(&T) -> String) -> Result<Json<SuccessResponse>, PlatformError> {
    match result.into_result() {
        Ok(value) => Ok(Json(SuccessResponse::with_message(message(&value)))),
        Err(e) => Err(PlatformError::rejected(StatusCode::BAD_REQUEST, e)),
    }
}

fn views(result: UseCaseResult<Vec<User>>) -> Result<Json<Vec<UserView>>, PlatformError> {
    let users = result.into_result()?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// Create a user
#[utoipa::path(
    post,
    path = "",
    tag = "users",
    operation_id = "createUser",
    request_body = CreateUserRequest,
    params(("X-Current-User" = String, Header, description = "Login of the acting user")),
    responses(
        (status = 200, description = "User created", body = SuccessResponse),
        (status = 400, description = "Rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login))]
pub async fn create_user(
    State(state): State<UsersState>,
    current: CurrentUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    // Missing fields are reported by validation; only unreadable bodies stop here.
    let Json(req) = payload.map_err(|rejection| PlatformError::validation(rejection.body_text()))?;
    let result = state.operations.create
        .execute(req.into(), current.execution_context())
        .await;
    acknowledge(result, |u| format!("User {} created", u.login))
}

/// List active users
///
/// Ordered by creation time. Non-admin callers get an empty list.
#[utoipa::path(
    get,
    path = "",
    tag = "users",
    operation_id = "getAllActiveUsers",
    params(("X-Current-User" = String, Header, description = "Login of the acting user")),
    responses(
        (status = 200, description = "Active users", body = Vec<UserView>)
    )
)]
#[instrument(skip_all, fields(actor = %current.login))]
pub async fn get_all_active(
    State(state): State<UsersState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserView>>, PlatformError> {
    views(state.operations.get_all_active.execute(current.execution_context()).await)
}

/// Get a user by login
#[utoipa::path(
    get,
    path = "/{login}",
    tag = "users",
    operation_id = "getUserByLogin",
    params(
        ("login" = String, Path, description = "User login"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 404, description = "Not found or not visible to the caller", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, login = %login))]
pub async fn get_by_login(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(login): Path<String>,
) -> Result<Json<UserView>, PlatformError> {
    let result = state.operations.get_by_login
        .execute(GetUserByLoginQuery { login }, current.execution_context())
        .await;
    match result.into_result() {
        Ok(user) => Ok(Json(user.into())),
        Err(e) => Err(PlatformError::rejected(StatusCode::NOT_FOUND, e)),
    }
}

/// Delete a user
///
/// Soft delete by default; `hard=true` removes the record.
#[utoipa::path(
    delete,
    path = "/{login}",
    tag = "users",
    operation_id = "deleteUser",
    params(
        ("login" = String, Path, description = "User login"),
        ("hard" = Option<bool>, Query, description = "Remove the record instead of revoking it"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "User deleted", body = SuccessResponse),
        (status = 400, description = "Rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, login = %login, hard = params.hard))]
pub async fn delete_user(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(login): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let hard = params.hard;
    let result = state.operations.delete
        .execute(DeleteUserCommand { login, hard }, current.execution_context())
        .await;
    acknowledge(result, |u| {
        let kind = if hard { "hard" } else { "soft" };
        format!("User {} {} deleted", u.login, kind)
    })
}

/// Authenticate by login and password
#[utoipa::path(
    get,
    path = "/authenticate",
    tag = "users",
    operation_id = "authenticate",
    params(
        ("login" = String, Query, description = "User login"),
        ("password" = String, Query, description = "User password")
    ),
    responses(
        (status = 200, description = "Credentials accepted", body = UserView),
        (status = 401, description = "Credentials rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(login = %params.login))]
pub async fn authenticate(
    State(state): State<UsersState>,
    correlation: Correlation,
    Query(params): Query<AuthenticateParams>,
) -> Result<Json<UserView>, PlatformError> {
    let command = AuthenticateCommand {
        login: params.login,
        password: params.password,
    };
    let result = state.operations.authenticate
        .execute(command, correlation.anonymous_context())
        .await;
    match result.into_result() {
        Ok(user) => Ok(Json(user.into())),
        Err(e) => Err(PlatformError::rejected(StatusCode::UNAUTHORIZED, e)),
    }
}

/// Users at least `age` years old
///
/// Revoked users are included. Non-admin callers get an empty list.
#[utoipa::path(
    get,
    path = "/older-than/{age}",
    tag = "users",
    operation_id = "getUsersOlderThan",
    params(
        ("age" = i64, Path, description = "Minimum age in whole years"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserView>),
        (status = 400, description = "Negative age", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, age = age))]
pub async fn get_older_than(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(age): Path<i64>,
) -> Result<Json<Vec<UserView>>, PlatformError> {
    if age < 0 {
        return Err(PlatformError::validation("Age must not be negative"));
    }
    let age = u32::try_from(age).unwrap_or(u32::MAX);
    views(state.operations.get_older_than
        .execute(GetUsersOlderThanQuery { age }, current.execution_context())
        .await)
}

/// Update name, gender or birthday
///
/// Unset parameters are left unchanged.
#[utoipa::path(
    put,
    path = "/profile/{login}",
    tag = "users",
    operation_id = "updateUserProfile",
    params(
        ("login" = String, Path, description = "User login"),
        ("newName" = Option<String>, Query, description = "New display name"),
        ("newGender" = Option<i32>, Query, description = "0 female, 1 male, 2 unknown"),
        ("newBirthday" = Option<String>, Query, description = "YYYY-MM-DD"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "Profile updated", body = SuccessResponse),
        (status = 400, description = "Rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, login = %login))]
pub async fn update_profile(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(login): Path<String>,
    Query(params): Query<UpdateProfileParams>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let command = UpdateProfileCommand {
        login,
        name: params.new_name,
        gender: params.new_gender,
        birthday: params.new_birthday,
    };
    let result = state.operations.update_profile
        .execute(command, current.execution_context())
        .await;
    acknowledge(result, |u| format!("Profile of {} updated", u.login))
}

/// Change a user's password
#[utoipa::path(
    put,
    path = "/password/{login}",
    tag = "users",
    operation_id = "changeUserPassword",
    params(
        ("login" = String, Path, description = "User login"),
        ("newPassword" = String, Query, description = "New password"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "Password changed", body = SuccessResponse),
        (status = 400, description = "Rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, login = %login))]
pub async fn change_password(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(login): Path<String>,
    Query(params): Query<ChangePasswordParams>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let command = ChangePasswordCommand {
        login,
        new_password: params.new_password,
    };
    let result = state.operations.change_password
        .execute(command, current.execution_context())
        .await;
    acknowledge(result, |u| format!("Password of {} changed", u.login))
}

/// Rename a user
#[utoipa::path(
    put,
    path = "/login/{login}",
    tag = "users",
    operation_id = "changeUserLogin",
    params(
        ("login" = String, Path, description = "Current login"),
        ("newLogin" = String, Query, description = "New login"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "Login changed", body = SuccessResponse),
        (status = 400, description = "Rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, login = %login))]
pub async fn change_login(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(login): Path<String>,
    Query(params): Query<ChangeLoginParams>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let command = ChangeLoginCommand {
        login: login.clone(),
        new_login: params.new_login,
    };
    let result = state.operations.change_login
        .execute(command, current.execution_context())
        .await;
    acknowledge(result, |u| format!("Login {} changed to {}", login, u.login))
}

/// Restore a soft-deleted user
#[utoipa::path(
    put,
    path = "/restore/{login}",
    tag = "users",
    operation_id = "restoreUser",
    params(
        ("login" = String, Path, description = "User login"),
        ("X-Current-User" = String, Header, description = "Login of the acting user")
    ),
    responses(
        (status = 200, description = "User restored", body = SuccessResponse),
        (status = 400, description = "Rejected", body = ApiError)
    )
)]
#[instrument(skip_all, fields(actor = %current.login, login = %login))]
pub async fn restore_user(
    State(state): State<UsersState>,
    current: CurrentUser,
    Path(login): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let result = state.operations.restore
        .execute(RestoreUserCommand { login }, current.execution_context())
        .await;
    acknowledge(result, |u| format!("User {} restored", u.login))
}

/// Create users router
pub fn users_router(state: UsersState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(create_user, get_all_active))
        .routes(routes!(authenticate))
        .routes(routes!(get_by_login, delete_user))
        .routes(routes!(get_older_than))
        .routes(routes!(update_profile))
        .routes(routes!(change_password))
        .routes(routes!(change_login))
        .routes(routes!(restore_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::entity::Gender;

    #[test]
    fn test_view_hides_password_and_derives_active() {
        let mut user = User::new("bob", "Password123", "Bob", Gender::Male, None, false, "Admin");
        user.revoke("Admin", Utc::now());

        let json = serde_json::to_value(UserView::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["active"], false);
        assert_eq!(json["gender"], 1);
        assert_eq!(json["revokedBy"], "Admin");
    }

    #[test]
    fn test_delete_defaults_to_soft() {
        let params: DeleteParams = serde_json::from_str("{}").unwrap();
        assert!(!params.hard);
    }
}
