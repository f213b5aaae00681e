//! The transfer coordinator: the one writer of the monetary state.
//!
//! `create_transfer` runs the validation pipeline in order (structural,
//! existence, idempotency, eligibility, sufficiency) and then performs
//! the atomic unit of work: insert the PENDING transaction, append the
//! DEBIT and CREDIT ledger entries, and mark the transaction COMPLETED —
//! all four writes commit together or not at all.
//!
//! Concurrency contract:
//! - Both account rows are locked `FOR UPDATE` in uuid order inside the
//!   unit of work, so the balance fold and the debit write are serialized
//!   per source account. Two concurrent transfers cannot both pass the
//!   sufficiency check against the same pre-debit balance.
//! - The idempotency key is uniquely indexed; a racing duplicate insert
//!   fails at the storage layer and the loser resolves the winner's
//!   result instead of writing a second pair of ledger entries.
//! - If the unit of work cannot commit, the rollback leaves a clean
//!   state and the coordinator records an explicit FAILED transaction
//!   for the key, so no ambiguous PENDING record ever survives.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use tally_core::ledger::LedgerEntry;
use tally_core::transfer::{
    self, IdempotencyDecision, TransferError, TransferRequest, resolve_idempotency,
};
use tally_shared::types::{AccountId, TransactionId};

use crate::entities::{accounts, ledger_entries, transactions};
use crate::repositories::ledger;

/// A committed transaction together with its double-entry pair.
#[derive(Debug, Clone)]
pub struct TransactionWithEntries {
    /// The completed transaction record.
    pub transaction: transactions::Model,
    /// The DEBIT and CREDIT ledger entries written for it.
    pub entries: Vec<ledger_entries::Model>,
}

/// Result of a transfer submission.
#[derive(Debug, Clone)]
pub enum TransferOutcome {
    /// A new transaction was committed by this call.
    Executed(TransactionWithEntries),
    /// The idempotency key matched an already-completed transaction;
    /// nothing was written.
    Replayed(transactions::Model),
}

impl TransferOutcome {
    /// Returns the transaction record regardless of outcome.
    #[must_use]
    pub const fn transaction(&self) -> &transactions::Model {
        match self {
            Self::Executed(executed) => &executed.transaction,
            Self::Replayed(transaction) => transaction,
        }
    }

    /// Returns true if this call committed new writes.
    #[must_use]
    pub const fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }
}

/// Failure modes inside the unit of work.
enum UowError {
    /// A business rule rejected the transfer; nothing was committed.
    Transfer(TransferError),
    /// The PENDING insert lost an idempotency race to a concurrent call.
    DuplicateKey,
    /// Storage failure during the write phase.
    Db(DbErr),
}

impl From<DbErr> for UowError {
    fn from(e: DbErr) -> Self {
        if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            Self::DuplicateKey
        } else {
            Self::Db(e)
        }
    }
}

/// Coordinates funds transfers between accounts.
#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    db: DatabaseConnection,
}

impl TransferCoordinator {
    /// Creates a new transfer coordinator.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Executes a transfer request with exactly-once semantics.
    ///
    /// # Errors
    ///
    /// Returns a `TransferError` describing the first failed check; all
    /// business-rule errors are raised before any mutation, so callers
    /// may retry them safely.
    pub async fn create_transfer(
        &self,
        request: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        self.submit(request, true).await
    }

    /// Issues an opening credit from a funding account through the same
    /// unit of work as a regular transfer — identical atomicity,
    /// idempotency, and commit ordering. Only the sufficiency gate is
    /// waived: the funding account is the issuance side of the double
    /// entry and legitimately runs negative.
    ///
    /// # Errors
    ///
    /// Returns a `TransferError` describing the first failed check.
    pub async fn issue_opening_credit(
        &self,
        request: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        self.submit(request, false).await
    }

    async fn submit(
        &self,
        request: TransferRequest,
        enforce_sufficiency: bool,
    ) -> Result<TransferOutcome, TransferError> {
        // Step 1: structural validation, before any storage access.
        transfer::validate_request(&request)?;

        let from_id = request.from_account.into_inner();
        let to_id = request.to_account.into_inner();

        // Step 2: both accounts must resolve.
        for account_id in [from_id, to_id] {
            let exists = accounts::Entity::find_by_id(account_id)
                .one(&self.db)
                .await
                .map_err(internal)?
                .is_some();
            if !exists {
                return Err(TransferError::AccountNotFound(AccountId::from_uuid(
                    account_id,
                )));
            }
        }

        // Step 3: idempotency fast path. The unique index remains the
        // authority; this lookup only avoids starting a doomed unit of
        // work for keys we already know about.
        let existing = self
            .find_by_key(&request.idempotency_key)
            .await
            .map_err(internal)?;
        if let Some(prior) = existing {
            return Self::short_circuit(prior);
        }

        // Steps 4-6 run inside the atomic unit of work.
        match self.unit_of_work(&request, enforce_sufficiency).await {
            Ok(outcome) => {
                info!(
                    transaction_id = %outcome.transaction().id,
                    from_account = %from_id,
                    to_account = %to_id,
                    amount = %request.amount,
                    "transfer completed"
                );
                Ok(outcome)
            }
            Err(UowError::Transfer(e)) => Err(e),
            Err(UowError::DuplicateKey) => {
                // Lost the race: surface whatever the winner produced.
                let winner = self
                    .find_by_key(&request.idempotency_key)
                    .await
                    .map_err(internal)?;
                match winner {
                    Some(prior) => Self::short_circuit(prior),
                    None => Err(TransferError::Internal(
                        "duplicate idempotency key with no matching transaction".to_string(),
                    )),
                }
            }
            Err(UowError::Db(e)) => {
                error!(
                    error = %e,
                    idempotency_key = %request.idempotency_key,
                    "unit of work aborted"
                );
                // The rollback left a clean state; record the failure so
                // the key resolves to PriorFailure rather than dangling.
                self.mark_failed(&request).await;
                Err(TransferError::Internal(e.to_string()))
            }
        }
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
    }

    /// Maps an existing transaction for the submitted key to its outcome.
    fn short_circuit(prior: transactions::Model) -> Result<TransferOutcome, TransferError> {
        let status: transfer::TransactionStatus = prior.status.clone().into();
        match resolve_idempotency(Some(status)) {
            IdempotencyDecision::AlreadyCompleted => Ok(TransferOutcome::Replayed(prior)),
            IdempotencyDecision::InProgress => {
                Err(TransferError::InProgress(prior.idempotency_key))
            }
            IdempotencyDecision::PriorFailure => {
                Err(TransferError::PriorFailure(prior.idempotency_key))
            }
            IdempotencyDecision::PriorReversal => {
                Err(TransferError::PriorReversal(prior.idempotency_key))
            }
            IdempotencyDecision::Proceed => Err(TransferError::Internal(
                "existing transaction resolved to proceed".to_string(),
            )),
        }
    }

    /// Runs the atomic write sequence; commits on success, rolls back on
    /// any failure.
    async fn unit_of_work(
        &self,
        request: &TransferRequest,
        enforce_sufficiency: bool,
    ) -> Result<TransferOutcome, UowError> {
        let txn = self.db.begin().await.map_err(UowError::from)?;

        match Self::write_transfer(&txn, request, enforce_sufficiency).await {
            Ok(outcome) => {
                txn.commit().await.map_err(UowError::from)?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "rollback after failed unit of work");
                }
                Err(e)
            }
        }
    }

    async fn write_transfer(
        txn: &DatabaseTransaction,
        request: &TransferRequest,
        enforce_sufficiency: bool,
    ) -> Result<TransferOutcome, UowError> {
        let from_id = request.from_account.into_inner();
        let to_id = request.to_account.into_inner();

        // Lock both account rows in uuid order so concurrent transfers
        // over the same accounts serialize instead of deadlocking.
        let (first, second) = if from_id <= to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };
        let first_row = Self::lock_account(txn, first).await?;
        let second_row = Self::lock_account(txn, second).await?;
        let (from_row, to_row) = if first == from_id {
            (first_row, second_row)
        } else {
            (second_row, first_row)
        };

        // Step 4: eligibility, checked on the locked rows.
        transfer::validate_eligibility(
            (request.from_account, from_row.status.into()),
            (request.to_account, to_row.status.into()),
        )
        .map_err(UowError::Transfer)?;

        // Step 5: sufficiency, folded under the lock so no concurrent
        // debit can slip between the check and our own debit.
        if enforce_sufficiency {
            let balance = ledger::fold_balance(txn, from_id).await?;
            transfer::validate_sufficiency(balance, request.amount).map_err(UowError::Transfer)?;
        }

        // Step 6: the four writes.
        let now = Utc::now();
        let transaction_id = Uuid::new_v4();

        let pending = transactions::ActiveModel {
            id: Set(transaction_id),
            from_account: Set(from_id),
            to_account: Set(to_id),
            amount: Set(request.amount),
            idempotency_key: Set(request.idempotency_key.clone()),
            status: Set(transfer::TransactionStatus::Pending.into()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let pending = pending.insert(txn).await.map_err(UowError::from)?;

        let (debit, credit) = LedgerEntry::double_entry(
            TransactionId::from_uuid(transaction_id),
            request.from_account,
            request.to_account,
            request.amount,
            now,
        );
        let debit_row = ledger::insert_entry(txn, &debit).await?;
        let credit_row = ledger::insert_entry(txn, &credit).await?;

        let mut active: transactions::ActiveModel = pending.into();
        active.status = Set(transfer::TransactionStatus::Completed.into());
        active.updated_at = Set(Utc::now().into());
        let completed = active.update(txn).await?;

        Ok(TransferOutcome::Executed(TransactionWithEntries {
            transaction: completed,
            entries: vec![debit_row, credit_row],
        }))
    }

    async fn lock_account(
        txn: &DatabaseTransaction,
        account_id: Uuid,
    ) -> Result<accounts::Model, UowError> {
        accounts::Entity::find_by_id(account_id)
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(UowError::from)?
            .ok_or_else(|| {
                UowError::Transfer(TransferError::AccountNotFound(AccountId::from_uuid(
                    account_id,
                )))
            })
    }

    /// Records an explicit FAILED transaction after an aborted unit of
    /// work. Best-effort: a failure here is logged, not propagated.
    async fn mark_failed(&self, request: &TransferRequest) {
        let now = Utc::now().into();
        let failed = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_account: Set(request.from_account.into_inner()),
            to_account: Set(request.to_account.into_inner()),
            amount: Set(request.amount),
            idempotency_key: Set(request.idempotency_key.clone()),
            status: Set(transfer::TransactionStatus::Failed.into()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        if let Err(e) = failed.insert(&self.db).await {
            warn!(
                error = %e,
                idempotency_key = %request.idempotency_key,
                "could not record FAILED transaction after aborted unit of work"
            );
        }
    }
}

/// Maps storage errors outside the unit of work.
fn internal(e: DbErr) -> TransferError {
    TransferError::Internal(e.to_string())
}
