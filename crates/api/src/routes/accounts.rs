//! Account routes: opening accounts and reading balances.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use tally_db::repositories::{AccountRepository, LedgerError, LedgerRepository};
use tally_shared::types::Currency;

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account_id}/balance", get(get_balance))
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// ISO 4217 currency code.
    pub currency: String,
}

/// POST /accounts - Open a new account for the authenticated user.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateAccountRequest>,
) -> impl IntoResponse {
    let Ok(currency) = Currency::from_str(&payload.currency) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_currency",
                "message": format!("Unknown currency: {}", payload.currency)
            })),
        )
            .into_response();
    };

    let account_repo = AccountRepository::new((*state.db).clone());
    match account_repo
        .create(auth.user_id(), currency.to_string())
        .await
    {
        Ok(account) => {
            info!(account_id = %account.id, user_id = %auth.user_id(), "Account opened");
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": account.id,
                    "currency": account.currency,
                    "status": account.status,
                    "created_at": account.created_at.to_rfc3339(),
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to create account");
            internal_error()
        }
    }
}

/// GET /accounts - List the authenticated user's accounts.
async fn list_accounts(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let account_repo = AccountRepository::new((*state.db).clone());

    match account_repo.list_for_user(auth.user_id()).await {
        Ok(accounts) => {
            let items: Vec<_> = accounts
                .into_iter()
                .map(|a| {
                    json!({
                        "id": a.id,
                        "currency": a.currency,
                        "status": a.status,
                        "created_at": a.created_at.to_rfc3339(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "accounts": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list accounts");
            internal_error()
        }
    }
}

/// GET /accounts/{account_id}/balance - Derived balance for an owned account.
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    let account_repo = AccountRepository::new((*state.db).clone());

    // Only the owner (or an admin) may read a balance.
    let account = match account_repo.find_by_id(account_id).await {
        Ok(Some(a)) => a,
        Ok(None) => return account_not_found(),
        Err(e) => {
            error!(error = %e, "Failed to load account");
            return internal_error();
        }
    };
    if account.user_id != auth.user_id() && !auth.is_admin() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "You do not own this account"
            })),
        )
            .into_response();
    }

    let ledger_repo = LedgerRepository::new((*state.db).clone());
    match ledger_repo.balance(account_id).await {
        Ok(balance) => (
            StatusCode::OK,
            Json(json!({
                "account_id": account_id,
                "balance": balance.to_string(),
                "currency": account.currency,
            })),
        )
            .into_response(),
        Err(LedgerError::AccountNotFound(_)) => account_not_found(),
        Err(e) => {
            error!(error = %e, "Failed to derive balance");
            internal_error()
        }
    }
}

fn account_not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": "Account not found"
        })),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}
