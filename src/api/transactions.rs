use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::application::{Bank, Posted, TransferResult};
use crate::domain::{TransactionRecord, TransactionStatus, TransactionType};

use super::ApiError;
use super::accounts::amount_param;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferQuery {
    pub from_account: String,
    pub to_account: String,
    pub amount: String,
}

pub async fn transfer(
    State(bank): State<Bank>,
    Query(query): Query<TransferQuery>,
) -> Result<Json<Posted<TransferResult>>, ApiError> {
    let amount = amount_param(&query.amount)?;
    let posted = bank
        .accounts
        .transfer(&query.from_account, &query.to_account, amount)
        .await?;
    Ok(Json(posted))
}

pub async fn list(State(bank): State<Bank>) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    Ok(Json(bank.transactions.all().await?))
}

pub async fn by_account(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    Ok(Json(bank.transactions.by_account(&account_number).await?))
}

pub async fn by_type(
    State(bank): State<Bank>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    let kind = TransactionType::from_str(&kind)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown transaction type: {}", kind)))?;
    Ok(Json(bank.transactions.by_type(kind).await?))
}

pub async fn by_status(
    State(bank): State<Bank>,
    Path(status): Path<String>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    let status = TransactionStatus::from_str(&status).ok_or_else(|| {
        ApiError::bad_request(format!("Unknown transaction status: {}", status))
    })?;
    Ok(Json(bank.transactions.by_status(status).await?))
}
