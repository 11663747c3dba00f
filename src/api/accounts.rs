use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::{AppError, Bank, Posted};
use crate::domain::{Account, AccountId, Amount, DEFAULT_CURRENCY, UserId, parse_amount};

use super::ApiError;

pub(crate) fn amount_param(raw: &str) -> Result<Amount, ApiError> {
    parse_amount(raw)
        .map_err(|e| AppError::InvalidAmount(format!("'{}': {}", raw, e)).into())
}

pub async fn list(State(bank): State<Bank>) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(bank.accounts.list_accounts().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateQuery {
    pub currency: Option<String>,
}

pub async fn create(
    State(bank): State<Bank>,
    Path(user_id): Path<UserId>,
    Query(query): Query<CreateQuery>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let currency = query.currency.as_deref().unwrap_or(DEFAULT_CURRENCY);
    let account = bank.accounts.create_account(user_id, currency).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_by_id(
    State(bank): State<Bank>,
    Path(id): Path<AccountId>,
) -> Result<Json<Account>, ApiError> {
    bank.accounts
        .get_account_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::not_found("ACCOUNT_NOT_FOUND", format!("Account not found: id {}", id))
        })
}

pub async fn get_by_number(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
) -> Result<Json<Account>, ApiError> {
    Ok(Json(bank.accounts.require_account(&account_number).await?))
}

pub async fn for_user(
    State(bank): State<Bank>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Account>>, ApiError> {
    Ok(Json(bank.accounts.get_user_accounts(user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AmountQuery {
    pub amount: String,
}

pub async fn deposit(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
    Query(query): Query<AmountQuery>,
) -> Result<Json<Posted<Account>>, ApiError> {
    let amount = amount_param(&query.amount)?;
    Ok(Json(bank.accounts.deposit(&account_number, amount).await?))
}

pub async fn withdraw(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
    Query(query): Query<AmountQuery>,
) -> Result<Json<Posted<Account>>, ApiError> {
    let amount = amount_param(&query.amount)?;
    Ok(Json(bank.accounts.withdraw(&account_number, amount).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub account_number: String,
    pub balance: Amount,
    pub currency: String,
}

pub async fn balance(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = bank.accounts.require_account(&account_number).await?;
    Ok(Json(BalanceResponse {
        account_number: account.account_number,
        balance: account.balance,
        currency: account.currency,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SufficiencyResponse {
    pub account_number: String,
    pub amount: Amount,
    pub sufficient: bool,
}

pub async fn sufficient(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
    Query(query): Query<AmountQuery>,
) -> Result<Json<SufficiencyResponse>, ApiError> {
    let amount = amount_param(&query.amount)?;
    let sufficient = bank
        .accounts
        .has_sufficient_balance(&account_number, amount)
        .await?;
    Ok(Json(SufficiencyResponse {
        account_number,
        amount,
        sufficient,
    }))
}

pub async fn delete(
    State(bank): State<Bank>,
    Path(id): Path<AccountId>,
) -> Result<StatusCode, ApiError> {
    bank.accounts.delete_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
