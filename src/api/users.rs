use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::{Bank, OperationStatus};
use crate::domain::{NewUser, User, UserId};

use super::ApiError;

fn user_not_found(what: impl std::fmt::Display) -> ApiError {
    ApiError::not_found("USER_NOT_FOUND", format!("User not found: {}", what))
}

pub async fn register(
    State(bank): State<Bank>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = bank.users.register_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list(State(bank): State<Bank>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(bank.users.get_all_users().await?))
}

pub async fn get_by_id(
    State(bank): State<Bank>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    bank.users
        .get_user_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| user_not_found(id))
}

pub async fn get_by_username(
    State(bank): State<Bank>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    bank.users
        .get_user_by_username(&username)
        .await?
        .map(Json)
        .ok_or_else(|| user_not_found(&username))
}

pub async fn block(
    State(bank): State<Bank>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(bank.users.block_user(id).await?))
}

pub async fn unblock(
    State(bank): State<Bank>,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(bank.users.unblock_user(id).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub user_id: UserId,
    pub status: OperationStatus,
    pub can_perform_operations: bool,
}

pub async fn status(
    State(bank): State<Bank>,
    Path(id): Path<UserId>,
) -> Result<Json<StatusResponse>, ApiError> {
    let status = bank.users.operation_status(id).await?;
    Ok(Json(StatusResponse {
        user_id: id,
        status,
        can_perform_operations: status.is_allowed(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    pub username: String,
    pub password: String,
}

pub async fn validate(
    State(bank): State<Bank>,
    Query(query): Query<CredentialsQuery>,
) -> Result<Json<User>, ApiError> {
    bank.users
        .validate_credentials(&query.username, &query.password)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))
}

pub async fn delete(
    State(bank): State<Bank>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    bank.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
