//! Ledger repository: a structurally append-only store.
//!
//! There is deliberately no update or delete operation anywhere in this
//! module — immutability of ledger entries is a property of the API
//! surface, not an intercepted write. The single insert path is
//! crate-private and only called from the transfer coordinator's unit of
//! work.

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use tally_core::ledger::{self, LedgerEntry};

use crate::entities::{accounts, ledger_entries};

/// Error types for ledger read operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Ledger repository for reads and balance derivation.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Derives an account's balance by folding its full ledger history.
    ///
    /// Cost is linear in the account's entry count per call.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn balance(&self, account_id: Uuid) -> Result<Decimal, LedgerError> {
        let exists = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .is_some();
        if !exists {
            return Err(LedgerError::AccountNotFound(account_id));
        }

        let balance = fold_balance(&self.db, account_id).await?;
        Ok(balance)
    }

    /// Lists an account's ledger entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist.
    pub async fn entries_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<ledger_entries::Model>, LedgerError> {
        let exists = accounts::Entity::find_by_id(account_id)
            .one(&self.db)
            .await?
            .is_some();
        if !exists {
            return Err(LedgerError::AccountNotFound(account_id));
        }

        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::AccountId.eq(account_id))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    /// Lists the entries belonging to a transaction (the double-entry pair).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Vec<ledger_entries::Model>, LedgerError> {
        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TransactionId.eq(transaction_id))
            .all(&self.db)
            .await?;
        Ok(entries)
    }
}

/// Folds an account's entries into its balance on any connection.
///
/// The coordinator calls this inside its unit of work so the fold is
/// consistent with the row locks it holds.
pub(crate) async fn fold_balance<C: ConnectionTrait>(
    conn: &C,
    account_id: Uuid,
) -> Result<Decimal, DbErr> {
    let entries = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::AccountId.eq(account_id))
        .all(conn)
        .await?;

    Ok(entries
        .iter()
        .map(|e| ledger::signed_amount(e.entry_type.clone().into(), e.amount))
        .sum())
}

/// Appends one ledger entry. Write-once: the only caller is the transfer
/// coordinator's unit of work.
pub(crate) async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: &LedgerEntry,
) -> Result<ledger_entries::Model, DbErr> {
    let model = ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        account_id: Set(entry.account_id.into_inner()),
        transaction_id: Set(entry.transaction_id.into_inner()),
        amount: Set(entry.amount),
        entry_type: Set(entry.entry_type.into()),
        created_at: Set(entry.created_at.into()),
    };

    model.insert(conn).await
}
