use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::application::{Bank, Document};
use crate::io::DocumentFormat;

use super::ApiError;

fn pick_format(raw: Option<&str>) -> Result<DocumentFormat, ApiError> {
    match raw {
        None => Ok(DocumentFormat::Text),
        Some(raw) => DocumentFormat::from_str(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unsupported document format: {}", raw))),
    }
}

fn attachment(document: Document) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        document.file_name
    ))
    .map_err(|_| ApiError::bad_request("Document name is not a valid header value"))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(document.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementQuery {
    pub period_start: String,
    pub period_end: String,
    pub format: Option<String>,
}

pub async fn statement(
    State(bank): State<Bank>,
    Path(account_number): Path<String>,
    Query(query): Query<StatementQuery>,
) -> Result<Response, ApiError> {
    let renderer = pick_format(query.format.as_deref())?.renderer();
    let document = bank
        .statements
        .statement(
            &account_number,
            &query.period_start,
            &query.period_end,
            renderer.as_ref(),
        )
        .await?;
    attachment(document)
}

#[derive(Debug, Deserialize)]
pub struct ReceiptQuery {
    pub format: Option<String>,
}

pub async fn receipt(
    State(bank): State<Bank>,
    Path(transaction_id): Path<String>,
    Query(query): Query<ReceiptQuery>,
) -> Result<Response, ApiError> {
    let renderer = pick_format(query.format.as_deref())?.renderer();
    let document = bank
        .statements
        .receipt(&transaction_id, renderer.as_ref())
        .await?;
    attachment(document)
}
