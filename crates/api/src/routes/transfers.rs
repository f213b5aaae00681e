//! Transfer routes: create, history, and CSV export.

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tracing::{error, warn};
use uuid::Uuid;

use crate::{AppState, middleware::AuthUser};
use tally_core::history::{ExportRow, HistoryFilter, SortField, SortOrder};
use tally_core::transfer::{TransferError, TransferRequest};
use tally_db::entities::transactions;
use tally_db::repositories::{
    AccountRepository, AuditEvent, AuditLogRepository, TransactionRepository, TransferCoordinator,
    TransferOutcome, UserRepository,
};
use tally_shared::types::{AccountId, PageRequest, PageResponse, TransactionId};

/// Creates the transfer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transfers", post(create_transfer))
        .route("/transfers", get(list_transfers))
        .route("/transfers/export", get(export_transfers))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    /// Source account.
    pub from_account: Uuid,
    /// Destination account.
    pub to_account: Uuid,
    /// Amount as a decimal string.
    pub amount: String,
    /// Caller-supplied idempotency key.
    pub idempotency_key: String,
}

/// Query parameters for listing and exporting transfers.
#[derive(Debug, Default, Deserialize)]
pub struct TransferListQuery {
    /// Filter by creation date range start (RFC 3339).
    pub from: Option<DateTime<Utc>>,
    /// Filter by creation date range end (RFC 3339).
    pub to: Option<DateTime<Utc>>,
    /// Minimum amount (inclusive).
    pub min_amount: Option<Decimal>,
    /// Maximum amount (inclusive).
    pub max_amount: Option<Decimal>,
    /// Direction relative to the requester: incoming/outgoing.
    pub direction: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Sort field (allow-listed).
    pub sort_by: Option<String>,
    /// Sort order: asc/desc.
    pub order: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size.
    pub per_page: Option<u32>,
}

/// Response item for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Source account.
    pub from_account: Uuid,
    /// Destination account.
    pub to_account: Uuid,
    /// Amount.
    pub amount: String,
    /// Status.
    pub status: String,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(t: transactions::Model) -> Self {
        let status: tally_core::transfer::TransactionStatus = t.status.into();
        Self {
            id: t.id,
            from_account: t.from_account,
            to_account: t.to_account,
            amount: t.amount.to_string(),
            status: status.to_string(),
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST /transfers - Move funds between two accounts.
async fn create_transfer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransferRequest>,
) -> impl IntoResponse {
    let Ok(amount) = Decimal::from_str(&payload.amount) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_amount",
                "message": "Invalid amount format"
            })),
        )
            .into_response();
    };

    // The source account must belong to the caller.
    let account_repo = AccountRepository::new((*state.db).clone());
    match account_repo.find_by_id(payload.from_account).await {
        Ok(Some(account)) if account.user_id == auth.user_id() => {}
        Ok(Some(_)) => {
            return (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "forbidden",
                    "message": "You do not own the source account"
                })),
            )
                .into_response();
        }
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "One or both accounts not found."
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to load source account");
            return internal_error();
        }
    }

    let request = TransferRequest {
        from_account: AccountId::from_uuid(payload.from_account),
        to_account: AccountId::from_uuid(payload.to_account),
        amount,
        idempotency_key: payload.idempotency_key,
    };

    // Safe business metadata for the audit trail.
    let audit_repo = AuditLogRepository::new((*state.db).clone());
    audit_repo
        .record(
            AuditEvent::new(
                Some(auth.user_id()),
                None,
                "POST",
                "/api/v1/transfers",
            )
            .with_meta(json!({
                "amount": request.amount.to_string(),
                "from_account": request.from_account,
                "to_account": request.to_account,
            })),
        )
        .await;

    let coordinator = TransferCoordinator::new((*state.db).clone());
    match coordinator.create_transfer(request).await {
        Ok(TransferOutcome::Executed(executed)) => {
            notify_sender(&state, auth.user_id(), &executed.transaction);
            (
                StatusCode::CREATED,
                Json(json!({
                    "transaction": TransactionResponse::from(executed.transaction),
                })),
            )
                .into_response()
        }
        Ok(TransferOutcome::Replayed(transaction)) => (
            StatusCode::OK,
            Json(json!({
                "message": "Transaction already completed.",
                "transaction": TransactionResponse::from(transaction),
            })),
        )
            .into_response(),
        Err(e) => transfer_error(&e),
    }
}

/// GET /transfers - Paginated transaction history for the caller's accounts.
async fn list_transfers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransferListQuery>,
) -> impl IntoResponse {
    let (filter, sort_field, sort_order, page) = match parse_query(&query) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let account_repo = AccountRepository::new((*state.db).clone());
    let owned = match account_repo.ids_for_user(auth.user_id()).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "Failed to list owned accounts");
            return internal_error();
        }
    };

    let tx_repo = TransactionRepository::new((*state.db).clone());
    match tx_repo
        .history(&owned, &filter, &page, sort_field, sort_order)
        .await
    {
        Ok(result) => {
            let items: Vec<TransactionResponse> = result
                .entries
                .into_iter()
                .map(TransactionResponse::from)
                .collect();
            let response = PageResponse::new(items, page.page, page.per_page, result.total);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to query history");
            internal_error()
        }
    }
}

/// GET /transfers/export - Stream the filtered history as CSV.
async fn export_transfers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TransferListQuery>,
) -> impl IntoResponse {
    let (filter, sort_field, sort_order, _) = match parse_query(&query) {
        Ok(parsed) => parsed,
        Err(response) => return response,
    };

    let account_repo = AccountRepository::new((*state.db).clone());
    let owned = match account_repo.ids_for_user(auth.user_id()).await {
        Ok(ids) => ids,
        Err(e) => {
            error!(error = %e, "Failed to list owned accounts");
            return internal_error();
        }
    };

    let tx_repo = TransactionRepository::new((*state.db).clone());
    let rows = tx_repo.export_stream(owned.clone(), &filter, sort_field, sort_order);

    let owned_ids: Vec<AccountId> = owned.iter().copied().map(AccountId::from_uuid).collect();
    let header = futures::stream::once(async {
        Ok::<_, std::io::Error>(CSV_HEADER.to_string())
    });
    let body_rows = rows.map(move |result| match result {
        Ok(model) => csv_line(model, &owned_ids),
        Err(e) => Err(std::io::Error::other(e.to_string())),
    });

    let body = Body::from_stream(header.chain(body_rows));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"transactions.csv\"",
        )
        .body(body)
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build export response");
            internal_error()
        })
}

// ============================================================================
// Helper Functions
// ============================================================================

const CSV_HEADER: &str = "id,from_account,to_account,amount,direction,status,created_at,updated_at\n";

/// Serializes one transaction as a CSV line.
fn csv_line(model: transactions::Model, owned: &[AccountId]) -> Result<String, std::io::Error> {
    let status: tally_core::transfer::TransactionStatus = model.status.into();
    let from_account = AccountId::from_uuid(model.from_account);
    let row = ExportRow {
        id: TransactionId::from_uuid(model.id),
        from_account,
        to_account: AccountId::from_uuid(model.to_account),
        amount: model.amount,
        direction: ExportRow::direction_for(from_account, owned),
        status,
        created_at: model.created_at.to_utc(),
        updated_at: model.updated_at.to_utc(),
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(&row).map_err(std::io::Error::other)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    String::from_utf8(bytes).map_err(std::io::Error::other)
}

type ParsedQuery = (HistoryFilter, SortField, SortOrder, PageRequest);

/// Parses list/export query parameters, rejecting unknown sort fields,
/// orders, directions, and statuses with a 400.
fn parse_query(query: &TransferListQuery) -> Result<ParsedQuery, Response> {
    let direction = match query.direction.as_deref() {
        Some(raw) => Some(
            raw.parse()
                .map_err(|e: String| bad_request("invalid_direction", &e))?,
        ),
        None => None,
    };

    let status = match query.status.as_deref() {
        Some(raw) => Some(parse_status(raw).ok_or_else(|| {
            bad_request("invalid_status", &format!("unknown status: {raw}"))
        })?),
        None => None,
    };

    let sort_field = match query.sort_by.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|e: String| bad_request("invalid_sort_field", &e))?,
        None => SortField::default(),
    };

    let sort_order = match query.order.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|e: String| bad_request("invalid_sort_order", &e))?,
        None => SortOrder::default(),
    };

    let filter = HistoryFilter {
        date_from: query.from,
        date_to: query.to,
        min_amount: query.min_amount,
        max_amount: query.max_amount,
        direction,
        status,
    };

    let mut page = PageRequest::default();
    if let Some(p) = query.page {
        page.page = p.max(1);
    }
    if let Some(per_page) = query.per_page {
        page.per_page = per_page;
    }

    Ok((filter, sort_field, sort_order, page))
}

fn parse_status(raw: &str) -> Option<tally_core::transfer::TransactionStatus> {
    use tally_core::transfer::TransactionStatus;
    match raw.to_uppercase().as_str() {
        "PENDING" => Some(TransactionStatus::Pending),
        "COMPLETED" => Some(TransactionStatus::Completed),
        "FAILED" => Some(TransactionStatus::Failed),
        "REVERSED" => Some(TransactionStatus::Reversed),
        _ => None,
    }
}

/// Fires the transfer notification without blocking or failing the
/// committed transfer.
fn notify_sender(state: &AppState, user_id: Uuid, transaction: &transactions::Model) {
    let email_service = state.email_service.clone();
    let db = state.db.clone();
    let amount = transaction.amount;
    let to_account = transaction.to_account.to_string();

    tokio::spawn(async move {
        let user_repo = UserRepository::new((*db).clone());
        let user = match user_repo.find_by_id(user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Could not load sender for transfer notification");
                return;
            }
        };

        if let Err(e) = email_service
            .send_transfer_notification(&user.email, &user.name, amount, &to_account)
            .await
        {
            warn!(error = %e, "Failed to send transfer notification");
        }
    });
}

fn transfer_error(e: &TransferError) -> Response {
    match e {
        TransferError::Validation(message) => bad_request("validation_error", message),
        TransferError::AccountNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "One or both accounts not found."
            })),
        )
            .into_response(),
        TransferError::InProgress(_) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "transfer_in_progress",
                "message": "Transaction is still pending."
            })),
        )
            .into_response(),
        TransferError::PriorFailure(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "prior_failure",
                "message": "Transaction has failed."
            })),
        )
            .into_response(),
        TransferError::PriorReversal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "prior_reversal",
                "message": "Transaction has been reversed."
            })),
        )
            .into_response(),
        TransferError::InactiveAccount { account, status } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "inactive_account",
                "message": format!("Account {account} is {status}"),
                "account": account,
                "status": status.to_string(),
            })),
        )
            .into_response(),
        TransferError::InsufficientFunds { balance, requested } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "insufficient_funds",
                "message": format!(
                    "Balance {balance} does not cover requested amount {requested}"
                ),
                "balance": balance.to_string(),
                "requested": requested.to_string(),
            })),
        )
            .into_response(),
        TransferError::Internal(message) => {
            error!(message, "Transfer failed internally");
            internal_error()
        }
    }
}

fn bad_request(error: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error, "message": message })),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tally_db::entities::sea_orm_active_enums::TransactionStatus as DbStatus;

    fn model(from_account: Uuid) -> transactions::Model {
        let now = Utc::now().into();
        transactions::Model {
            id: Uuid::new_v4(),
            from_account,
            to_account: Uuid::new_v4(),
            amount: dec!(99.50),
            idempotency_key: "k1".to_string(),
            status: DbStatus::Completed,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_csv_line_outgoing() {
        let from = Uuid::new_v4();
        let line = csv_line(model(from), &[AccountId::from_uuid(from)]).unwrap();

        assert!(line.contains("outgoing"));
        assert!(line.contains("COMPLETED"));
        assert!(line.contains("99.50"));
        // The idempotency key is not part of the public export surface.
        assert!(!line.contains("k1"));
    }

    #[test]
    fn test_csv_line_incoming() {
        let line = csv_line(model(Uuid::new_v4()), &[AccountId::new()]).unwrap();
        assert!(line.contains("incoming"));
    }

    #[test]
    fn test_csv_header_matches_row_shape() {
        let columns = CSV_HEADER.trim().split(',').count();
        let from = Uuid::new_v4();
        let line = csv_line(model(from), &[]).unwrap();
        assert_eq!(line.trim().split(',').count(), columns);
    }

    #[test]
    fn test_parse_query_defaults() {
        let (filter, sort_field, sort_order, page) =
            parse_query(&TransferListQuery::default()).map_err(|_| ()).unwrap();
        assert!(filter.status.is_none());
        assert_eq!(sort_field, SortField::CreatedAt);
        assert_eq!(sort_order, SortOrder::Desc);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_parse_query_rejects_unknown_sort() {
        let query = TransferListQuery {
            sort_by: Some("idempotency_key".to_string()),
            ..Default::default()
        };
        assert!(parse_query(&query).is_err());
    }

    #[test]
    fn test_parse_status_values() {
        assert!(parse_status("completed").is_some());
        assert!(parse_status("PENDING").is_some());
        assert!(parse_status("bogus").is_none());
    }
}
