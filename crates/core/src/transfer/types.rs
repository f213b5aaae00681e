//! Transfer domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::AccountId;

/// Transaction status.
///
/// The happy path is `Pending → Completed`. A unit of work that cannot
/// commit is recorded as `Failed` so no ambiguous `Pending` record
/// survives; `Reversed` is reserved for compensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Created inside the unit of work; not yet committed as complete.
    Pending,
    /// Both ledger entries are durably written.
    Completed,
    /// The unit of work could not commit.
    Failed,
    /// The transfer was compensated after completion.
    Reversed,
}

impl TransactionStatus {
    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Reversed)
    }

    /// Returns true if `next` is a legal transition from this status.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
                | (Self::Completed, Self::Reversed)
        )
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Reversed => write!(f, "REVERSED"),
        }
    }
}

/// A transfer request as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Source account.
    pub from_account: AccountId,
    /// Destination account.
    pub to_account: AccountId,
    /// Amount to move (currency-scaled decimal, must be positive).
    pub amount: Decimal,
    /// Caller-supplied token making retries safe.
    pub idempotency_key: String,
}

/// Outcome of resolving an idempotency key against the transaction log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyDecision {
    /// No transaction exists for the key; the coordinator may proceed.
    Proceed,
    /// A completed transaction exists; return it, write nothing.
    AlreadyCompleted,
    /// A pending transaction exists; report "still processing".
    InProgress,
    /// A prior attempt with this key failed.
    PriorFailure,
    /// The transaction for this key has been reversed.
    PriorReversal,
}

/// Resolves an idempotency lookup result into a decision.
///
/// The lookup itself must be backed by a storage-level uniqueness
/// constraint on the key; this function only maps the observed status.
#[must_use]
pub fn resolve_idempotency(existing: Option<TransactionStatus>) -> IdempotencyDecision {
    match existing {
        None => IdempotencyDecision::Proceed,
        Some(TransactionStatus::Completed) => IdempotencyDecision::AlreadyCompleted,
        Some(TransactionStatus::Pending) => IdempotencyDecision::InProgress,
        Some(TransactionStatus::Failed) => IdempotencyDecision::PriorFailure,
        Some(TransactionStatus::Reversed) => IdempotencyDecision::PriorReversal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, IdempotencyDecision::Proceed)]
    #[case(Some(TransactionStatus::Completed), IdempotencyDecision::AlreadyCompleted)]
    #[case(Some(TransactionStatus::Pending), IdempotencyDecision::InProgress)]
    #[case(Some(TransactionStatus::Failed), IdempotencyDecision::PriorFailure)]
    #[case(Some(TransactionStatus::Reversed), IdempotencyDecision::PriorReversal)]
    fn test_resolve_idempotency(
        #[case] existing: Option<TransactionStatus>,
        #[case] expected: IdempotencyDecision,
    ) {
        assert_eq!(resolve_idempotency(existing), expected);
    }

    #[test]
    fn test_happy_path_transition() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Completed));
    }

    #[test]
    fn test_abort_transition() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Failed));
    }

    #[test]
    fn test_compensation_transition() {
        assert!(TransactionStatus::Completed.can_transition_to(TransactionStatus::Reversed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!TransactionStatus::Completed.can_transition_to(TransactionStatus::Pending));
        assert!(!TransactionStatus::Completed.can_transition_to(TransactionStatus::Completed));
        assert!(!TransactionStatus::Failed.can_transition_to(TransactionStatus::Completed));
        assert!(!TransactionStatus::Failed.can_transition_to(TransactionStatus::Pending));
        assert!(!TransactionStatus::Reversed.can_transition_to(TransactionStatus::Completed));
        assert!(!TransactionStatus::Pending.can_transition_to(TransactionStatus::Reversed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransactionStatus::Failed.is_terminal());
        assert!(TransactionStatus::Reversed.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::Completed.is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TransactionStatus::Pending.to_string(), "PENDING");
        assert_eq!(TransactionStatus::Completed.to_string(), "COMPLETED");
        assert_eq!(TransactionStatus::Failed.to_string(), "FAILED");
        assert_eq!(TransactionStatus::Reversed.to_string(), "REVERSED");
    }
}
