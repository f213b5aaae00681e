//! Transfer error taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountStatus;
use tally_shared::types::AccountId;

/// Errors returned by the transfer pipeline.
///
/// Everything except `Internal` is detected before any mutation, so
/// callers may retry those without risk of a double spend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The request is structurally invalid (missing/invalid fields).
    #[error("{0}")]
    Validation(String),

    /// One of the referenced accounts does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// A prior attempt with this key is still pending.
    #[error("transfer with key '{0}' is still processing")]
    InProgress(String),

    /// A prior attempt with this key failed.
    #[error("a prior transfer with key '{0}' has failed")]
    PriorFailure(String),

    /// The transfer for this key was reversed.
    #[error("the transfer with key '{0}' has been reversed")]
    PriorReversal(String),

    /// One of the accounts is not active.
    #[error("account {account} is {status}")]
    InactiveAccount {
        /// The ineligible account.
        account: AccountId,
        /// Its current status, for client-side correction.
        status: AccountStatus,
    },

    /// The source balance does not cover the requested amount.
    #[error("balance {balance} does not cover requested amount {requested}")]
    InsufficientFunds {
        /// The source account's current balance.
        balance: Decimal,
        /// The requested transfer amount.
        requested: Decimal,
    },

    /// Storage or atomicity failure during the write phase.
    #[error("transfer could not be committed: {0}")]
    Internal(String),
}
