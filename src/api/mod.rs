//! HTTP surface. Thin handlers over the application services; every route
//! lives under `/api`.

mod accounts;
mod documents;
mod error;
mod transactions;
mod users;

pub use error::*;

use anyhow::{Context, Result};
use axum::Json;
use axum::Router;
use axum::routing::{get, post};
use serde_json::{Value, json};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::Bank;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Build the full application router.
pub fn router(bank: Bank) -> Router {
    let user_routes = Router::new()
        .route("/", get(users::list))
        .route("/register", post(users::register))
        .route("/validate", post(users::validate))
        .route("/username/{username}", get(users::get_by_username))
        .route("/{id}", get(users::get_by_id).delete(users::delete))
        .route("/{id}/block", post(users::block))
        .route("/{id}/unblock", post(users::unblock))
        .route("/{id}/status", get(users::status));

    // Path parameters at the same position share a name.
    let account_routes = Router::new()
        .route("/", get(accounts::list))
        .route("/users/{user_id}/create", post(accounts::create))
        .route("/number/{account}", get(accounts::get_by_number))
        .route("/user/{user_id}", get(accounts::for_user))
        .route("/{account}", get(accounts::get_by_id).delete(accounts::delete))
        .route("/{account}/deposit", post(accounts::deposit))
        .route("/{account}/withdraw", post(accounts::withdraw))
        .route("/{account}/balance", get(accounts::balance))
        .route("/{account}/sufficient", get(accounts::sufficient));

    let transaction_routes = Router::new()
        .route("/", get(transactions::list))
        .route("/transfer", post(transactions::transfer))
        .route("/account/{account}", get(transactions::by_account))
        .route("/type/{kind}", get(transactions::by_type))
        .route("/status/{status}", get(transactions::by_status));

    let api = Router::new()
        .route("/health", get(health))
        .nest("/users", user_routes)
        .nest("/accounts", account_routes)
        .nest("/transactions", transaction_routes)
        .route("/statements/{account}", get(documents::statement))
        .route("/receipts/{transaction_id}", get(documents::receipt));

    Router::new()
        .nest("/api", api)
        .with_state(bank)
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until Ctrl-C.
pub async fn serve(bank: Bank, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, router(bank))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
