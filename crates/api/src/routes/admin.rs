//! Administrative account lifecycle routes.
//!
//! Freeze and unfreeze gate every future transfer through the
//! coordinator's eligibility check; they never touch the ledger.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use tally_db::repositories::{AccountError, AccountRepository};

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/accounts/{account_id}/freeze", post(freeze_account))
        .route(
            "/admin/accounts/{account_id}/unfreeze",
            post(unfreeze_account),
        )
}

/// POST /admin/accounts/{account_id}/freeze - Freeze an account.
async fn freeze_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let account_repo = AccountRepository::new((*state.db).clone());
    match account_repo.freeze(account_id).await {
        Ok(account) => {
            info!(account_id = %account_id, admin = %auth.user_id(), "Account frozen");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Account has been frozen.",
                    "account": { "id": account.id, "status": account.status },
                })),
            )
                .into_response()
        }
        Err(e) => lifecycle_error(&e),
    }
}

/// POST /admin/accounts/{account_id}/unfreeze - Restore an account to active.
async fn unfreeze_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(response) = require_admin(&auth) {
        return response;
    }

    let account_repo = AccountRepository::new((*state.db).clone());
    match account_repo.unfreeze(account_id).await {
        Ok(account) => {
            info!(account_id = %account_id, admin = %auth.user_id(), "Account unfrozen");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Account has been unfrozen.",
                    "account": { "id": account.id, "status": account.status },
                })),
            )
                .into_response()
        }
        Err(e) => lifecycle_error(&e),
    }
}

fn require_admin(auth: &AuthUser) -> Result<(), axum::response::Response> {
    if auth.is_admin() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "forbidden",
                "message": "Administrative privileges required"
            })),
        )
            .into_response())
    }
}

fn lifecycle_error(e: &AccountError) -> axum::response::Response {
    match e {
        AccountError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Account not found."
            })),
        )
            .into_response(),
        AccountError::AlreadyFrozen(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "already_frozen",
                "message": "Account is already frozen."
            })),
        )
            .into_response(),
        AccountError::NotFrozen(_, status) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "not_frozen",
                "message": format!("Account is not frozen (current status: {status}).")
            })),
        )
            .into_response(),
        AccountError::Closed(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "account_closed",
                "message": "Account is closed."
            })),
        )
            .into_response(),
        AccountError::Database(err) => {
            error!(error = %err, "Account lifecycle operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}
